use std::sync::Arc;

use bistro_auth::TokenService;
use bistro_store::{InMemoryStore, PostgresStore, Store};

#[tokio::main]
async fn main() {
    bistro_observability::init();

    let jwt_secret = std::env::var("BISTRO_JWT_SECRET").unwrap_or_else(|_| {
        tracing::warn!("BISTRO_JWT_SECRET not set; using insecure dev default");
        "dev-secret".to_string()
    });

    let ttl_minutes = std::env::var("BISTRO_TOKEN_TTL_MINUTES")
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(60);
    let tokens = TokenService::new(&jwt_secret, chrono::Duration::minutes(ttl_minutes));

    let store: Arc<dyn Store> = match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(10)
                .connect(&url)
                .await
                .expect("failed to connect to postgres");
            let store = PostgresStore::new(pool);
            store.migrate().await.expect("failed to run schema migration");
            Arc::new(store)
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; state lives in memory only");
            Arc::new(InMemoryStore::new())
        }
    };

    let app = bistro_api::app::build_app(store, tokens);

    let bind = std::env::var("BISTRO_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {bind}: {e}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
