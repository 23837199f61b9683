use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

use bistro_auth::{Claims, TokenService};
use bistro_store::InMemoryStore;

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory store, ephemeral port.
        let store = Arc::new(InMemoryStore::new());
        let tokens = TokenService::new(JWT_SECRET, ChronoDuration::minutes(10));
        let app = bistro_api::app::build_app(store, tokens);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn signup(
    client: &reqwest::Client,
    base_url: &str,
    nickname: &str,
    password: &str,
    user_type: Option<&str>,
) -> reqwest::Response {
    let mut body = json!({ "nickname": nickname, "password": password });
    if let Some(t) = user_type {
        body["userType"] = json!(t);
    }
    client
        .post(format!("{}/api/users/signup", base_url))
        .json(&body)
        .send()
        .await
        .unwrap()
}

/// Sign in and return the session cookie as a `Cookie` header value.
async fn signin_cookie(
    client: &reqwest::Client,
    base_url: &str,
    nickname: &str,
    password: &str,
) -> String {
    let res = client
        .post(format!("{}/api/users/signin", base_url))
        .json(&json!({ "nickname": nickname, "password": password }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let set_cookie = res
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .expect("signin did not set a cookie")
        .to_str()
        .unwrap();
    // The cookie value is percent-encoded on the wire: `Bearer%20<jwt>`.
    assert!(set_cookie.starts_with("authorization=Bearer"));

    set_cookie.split(';').next().unwrap().to_string()
}

async fn signed_in(
    client: &reqwest::Client,
    base_url: &str,
    nickname: &str,
    user_type: Option<&str>,
) -> String {
    let res = signup(client, base_url, nickname, "password1", user_type).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    signin_cookie(client, base_url, nickname, "password1").await
}

/// Mint a cookie directly, bypassing signin (for bad-token scenarios).
fn forged_cookie(sub: i64, expires_in: ChronoDuration) -> String {
    let now = Utc::now();
    let claims = Claims {
        sub,
        iat: now.timestamp(),
        exp: (now + expires_in).timestamp(),
    };
    let token = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt");
    format!("authorization=Bearer {}", token)
}

fn assert_cookie_cleared(res: &reqwest::Response) {
    let set_cookie = res
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .expect("401 did not clear the session cookie")
        .to_str()
        .unwrap();
    assert!(set_cookie.starts_with("authorization="));
    assert!(!set_cookie.contains("Bearer"));
}

async fn create_category(
    client: &reqwest::Client,
    base_url: &str,
    cookie: &str,
    name: &str,
    order: i32,
) -> i64 {
    let res = client
        .post(format!("{}/api/category", base_url))
        .header(reqwest::header::COOKIE, cookie)
        .json(&json!({ "name": name, "order": order }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    body["data"]["id"].as_i64().unwrap()
}

async fn create_menu(
    client: &reqwest::Client,
    base_url: &str,
    cookie: &str,
    category_id: i64,
    name: &str,
    price: i64,
) -> i64 {
    let res = client
        .post(format!("{}/api/category/{}/menu", base_url, category_id))
        .header(reqwest::header::COOKIE, cookie)
        .json(&json!({
            "name": name,
            "description": "freshly made",
            "image": "https://img.example/menu.png",
            "price": price,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    body["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn signup_then_duplicate_nickname_conflicts() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = signup(&client, &srv.base_url, "alice", "password1", None).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = signup(&client, &srv.base_url, "alice", "password2", None).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn signup_validation_rejects_short_fields() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = signup(&client, &srv.base_url, "a", "password1", None).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = signup(&client, &srv.base_url, "alice", "p", None).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = signup(&client, &srv.base_url, "alice", "password1", Some("Admin")).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn signin_with_wrong_password_is_unauthorized_without_cookie() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = signup(&client, &srv.base_url, "alice", "password1", None).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(format!("{}/api/users/signin", srv.base_url))
        .json(&json!({ "nickname": "alice", "password": "wrong-one" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().get(reqwest::header::SET_COOKIE).is_none());

    // Unknown nickname answers the same way.
    let res = client
        .post(format!("{}/api/users/signin", srv.base_url))
        .json(&json!({ "nickname": "nobody", "password": "password1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn catalog_reads_are_public() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // Anonymous menu browsing: no cookie needed for the read path.
    let res = client
        .get(format!("{}/api/category", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn mutations_require_the_cookie() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/category", srv.base_url))
        .json(&json!({ "name": "mains", "order": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_cookie_cleared(&res);

    let res = client
        .get(format!("{}/api/orders/customer", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_cookie_cleared(&res);
}

#[tokio::test]
async fn non_bearer_scheme_is_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/orders/customer", srv.base_url))
        .header(reqwest::header::COOKIE, "authorization=Token abc")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_cookie_cleared(&res);
}

#[tokio::test]
async fn expired_token_is_rejected_and_cookie_cleared() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let cookie = forged_cookie(1, ChronoDuration::minutes(-5));
    let res = client
        .get(format!("{}/api/orders/customer", srv.base_url))
        .header(reqwest::header::COOKIE, cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_cookie_cleared(&res);
}

#[tokio::test]
async fn token_for_missing_user_is_treated_as_revoked() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // Valid signature, valid expiry, but no such user row.
    let cookie = forged_cookie(9999, ChronoDuration::minutes(5));
    let res = client
        .get(format!("{}/api/orders/customer", srv.base_url))
        .header(reqwest::header::COOKIE, cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_cookie_cleared(&res);
}

#[tokio::test]
async fn customer_cannot_create_a_category() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let cookie = signed_in(&client, &srv.base_url, "carol", None).await;

    let res = client
        .post(format!("{}/api/category", srv.base_url))
        .header(reqwest::header::COOKIE, &cookie)
        .json(&json!({ "name": "mains", "order": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Nothing was persisted.
    let res = client
        .get(format!("{}/api/category", srv.base_url))
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn owner_category_lifecycle() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let cookie = signed_in(&client, &srv.base_url, "owner1", Some("Owner")).await;

    let second = create_category(&client, &srv.base_url, &cookie, "drinks", 2).await;
    let first = create_category(&client, &srv.base_url, &cookie, "mains", 1).await;

    // Listed by display order, not insertion order.
    let res = client
        .get(format!("{}/api/category", srv.base_url))
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["id"].as_i64().unwrap(), first);
    assert_eq!(data[1]["id"].as_i64().unwrap(), second);

    // Rename + reorder in one update.
    let res = client
        .patch(format!("{}/api/category/{}", srv.base_url, first))
        .header(reqwest::header::COOKIE, &cookie)
        .json(&json!({ "name": "specials", "order": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"]["name"].as_str().unwrap(), "specials");

    // Update without order is a validation failure.
    let res = client
        .patch(format!("{}/api/category/{}", srv.base_url, first))
        .header(reqwest::header::COOKIE, &cookie)
        .json(&json!({ "name": "specials" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .delete(format!("{}/api/category/{}", srv.base_url, first))
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Deleting it again is a 404; it is gone from the listing.
    let res = client
        .delete(format!("{}/api/category/{}", srv.base_url, first))
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .get(format!("{}/api/category", srv.base_url))
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn menu_create_rejects_negative_price_and_persists_nothing() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let cookie = signed_in(&client, &srv.base_url, "owner1", Some("owner")).await;
    let category = create_category(&client, &srv.base_url, &cookie, "mains", 1).await;

    let res = client
        .post(format!("{}/api/category/{}/menu", srv.base_url, category))
        .header(reqwest::header::COOKIE, &cookie)
        .json(&json!({
            "name": "pasta",
            "description": "freshly made",
            "image": "https://img.example/pasta.png",
            "price": -1,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(format!("{}/api/category/{}/menu", srv.base_url, category))
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn menu_routes_are_scoped_to_their_category() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let cookie = signed_in(&client, &srv.base_url, "owner1", Some("Owner")).await;
    let mains = create_category(&client, &srv.base_url, &cookie, "mains", 1).await;
    let drinks = create_category(&client, &srv.base_url, &cookie, "drinks", 2).await;
    let pasta = create_menu(&client, &srv.base_url, &cookie, mains, "pasta", 1200).await;

    // Reachable under its own category.
    let res = client
        .get(format!("{}/api/category/{}/menu/{}", srv.base_url, mains, pasta))
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Not under a sibling category.
    let res = client
        .get(format!("{}/api/category/{}/menu/{}", srv.base_url, drinks, pasta))
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Listing a missing category is a 404, empty category is a 200.
    let res = client
        .get(format!("{}/api/category/{}/menu", srv.base_url, 999))
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .get(format!("{}/api/category/{}/menu", srv.base_url, drinks))
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn menu_patch_updates_only_given_fields() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let cookie = signed_in(&client, &srv.base_url, "owner1", Some("Owner")).await;
    let mains = create_category(&client, &srv.base_url, &cookie, "mains", 1).await;
    let pasta = create_menu(&client, &srv.base_url, &cookie, mains, "pasta", 1200).await;

    let res = client
        .patch(format!("{}/api/category/{}/menu/{}", srv.base_url, mains, pasta))
        .header(reqwest::header::COOKIE, &cookie)
        .json(&json!({ "price": 1500, "status": "SOLD_OUT" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"]["price"].as_i64().unwrap(), 1500);
    assert_eq!(body["data"]["status"].as_str().unwrap(), "SOLD_OUT");
    assert_eq!(body["data"]["name"].as_str().unwrap(), "pasta");
}

#[tokio::test]
async fn deleted_menu_is_gone_and_cannot_be_deleted_twice() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let cookie = signed_in(&client, &srv.base_url, "owner1", Some("Owner")).await;
    let mains = create_category(&client, &srv.base_url, &cookie, "mains", 1).await;
    let pasta = create_menu(&client, &srv.base_url, &cookie, mains, "pasta", 1200).await;

    let res = client
        .delete(format!("{}/api/category/{}/menu/{}", srv.base_url, mains, pasta))
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Soft-deleted: invisible to reads, and a second delete finds nothing.
    let res = client
        .get(format!("{}/api/category/{}/menu/{}", srv.base_url, mains, pasta))
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .delete(format!("{}/api/category/{}/menu/{}", srv.base_url, mains, pasta))
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_category_cascades_to_its_active_menus() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let cookie = signed_in(&client, &srv.base_url, "owner1", Some("Owner")).await;
    let mains = create_category(&client, &srv.base_url, &cookie, "mains", 1).await;
    let pasta = create_menu(&client, &srv.base_url, &cookie, mains, "pasta", 1200).await;
    create_menu(&client, &srv.base_url, &cookie, mains, "curry", 1400).await;

    let res = client
        .delete(format!("{}/api/category/{}", srv.base_url, mains))
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // The category and both menus are gone from reads.
    let res = client
        .get(format!("{}/api/category", srv.base_url))
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let res = client
        .get(format!("{}/api/category/{}/menu/{}", srv.base_url, mains, pasta))
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn order_flow_customer_places_owner_oversees() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let owner = signed_in(&client, &srv.base_url, "owner1", Some("Owner")).await;
    let mains = create_category(&client, &srv.base_url, &owner, "mains", 1).await;
    let pasta = create_menu(&client, &srv.base_url, &owner, mains, "pasta", 1200).await;

    let customer = signed_in(&client, &srv.base_url, "carol", Some("Customer")).await;

    // Zero quantity never persists.
    let res = client
        .post(format!("{}/api/orders", srv.base_url))
        .header(reqwest::header::COOKIE, &customer)
        .json(&json!({ "menuId": pasta, "quantity": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Ordering a missing menu is a 404.
    let res = client
        .post(format!("{}/api/orders", srv.base_url))
        .header(reqwest::header::COOKIE, &customer)
        .json(&json!({ "menuId": 999, "quantity": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .post(format!("{}/api/orders", srv.base_url))
        .header(reqwest::header::COOKIE, &customer)
        .json(&json!({ "menuId": pasta, "quantity": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    // Customer listing carries menu data and the computed total.
    let res = client
        .get(format!("{}/api/orders/customer", srv.base_url))
        .header(reqwest::header::COOKIE, &customer)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let orders = body.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["menuName"].as_str().unwrap(), "pasta");
    assert_eq!(orders[0]["totalAmount"].as_i64().unwrap(), 2400);
    assert_eq!(orders[0]["orderStatus"].as_str().unwrap(), "PENDING");

    // Customers cannot see the owner view.
    let res = client
        .get(format!("{}/api/orders/owner", srv.base_url))
        .header(reqwest::header::COOKIE, &customer)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Owner sees every order with the customer's nickname.
    let res = client
        .get(format!("{}/api/orders/owner", srv.base_url))
        .header(reqwest::header::COOKIE, &owner)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let orders = body.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["nickname"].as_str().unwrap(), "carol");
    assert_eq!(orders[0]["totalAmount"].as_i64().unwrap(), 2400);
}

#[tokio::test]
async fn owner_updates_order_status_with_201() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let owner = signed_in(&client, &srv.base_url, "owner1", Some("Owner")).await;
    let mains = create_category(&client, &srv.base_url, &owner, "mains", 1).await;
    let pasta = create_menu(&client, &srv.base_url, &owner, mains, "pasta", 1200).await;

    let customer = signed_in(&client, &srv.base_url, "carol", None).await;
    let res = client
        .post(format!("{}/api/orders", srv.base_url))
        .header(reqwest::header::COOKIE, &customer)
        .json(&json!({ "menuId": pasta, "quantity": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    // Status update answers 201, kept for client compatibility.
    let res = client
        .patch(format!("{}/api/orders/{}/status", srv.base_url, 1))
        .header(reqwest::header::COOKIE, &owner)
        .json(&json!({ "status": "SERVED" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    // A missing order is a 404 even on this quirky route.
    let res = client
        .patch(format!("{}/api/orders/{}/status", srv.base_url, 999))
        .header(reqwest::header::COOKIE, &owner)
        .json(&json!({ "status": "SERVED" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // The customer sees the new status.
    let res = client
        .get(format!("{}/api/orders/customer", srv.base_url))
        .header(reqwest::header::COOKIE, &customer)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body[0]["orderStatus"].as_str().unwrap(), "SERVED");
}
