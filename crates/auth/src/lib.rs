//! `bistro-auth` — pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it issues and
//! verifies identity tokens, hashes credentials, and validates user payloads.
//! Looking tokens up against live user rows is the HTTP layer's job.

pub mod password;
pub mod roles;
pub mod token;
pub mod user;

pub use password::{hash_password, verify_password, PasswordError};
pub use roles::Role;
pub use token::{Claims, TokenError, TokenService};
pub use user::{Credentials, Signup, User};
