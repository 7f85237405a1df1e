//! Router-level tests
//!
//! Authentication and permission checks reject requests before any query
//! runs, so these use a lazily connecting pool and need no database.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

use erp_stock::config::{
    Config, DatabaseConfig, InventoryConfig, JwtConfig, LoggingConfig, ServerConfig,
};
use erp_stock::middleware::auth::Claims;
use erp_stock::{create_app, AppState};

const SECRET: &str = "test-secret";

fn test_config() -> Config {
    Config {
        environment: "test".to_string(),
        server: ServerConfig::default(),
        database: DatabaseConfig {
            url: "postgres://localhost/erp_stock_test".to_string(),
            max_connections: 1,
            min_connections: 0,
            acquire_timeout_secs: 1,
            lock_timeout_ms: 1000,
            statement_timeout_ms: 1000,
        },
        jwt: JwtConfig {
            secret: SECRET.to_string(),
        },
        logging: LoggingConfig::default(),
        inventory: InventoryConfig::default(),
    }
}

fn app() -> Router {
    let config = test_config();
    let db = PgPoolOptions::new()
        .max_connections(1)
        .connect_lazy(&config.database.url)
        .unwrap();
    create_app(AppState {
        db,
        config: Arc::new(config),
    })
}

fn token(permissions: &[&str]) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: Uuid::new_v4().to_string(),
        branch_id: Some(1),
        permissions: permissions.iter().map(|p| p.to_string()).collect(),
        exp: now + 3600,
        iat: now,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

fn get(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(t) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
    }
    builder.body(Body::empty()).unwrap()
}

async fn error_code(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    body["error"]["code"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let response = app().oneshot(get("/api/v1/stock-transfers", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(response).await, "UNAUTHORIZED");
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let forged = encode(
        &Header::default(),
        &Claims {
            sub: Uuid::new_v4().to_string(),
            branch_id: None,
            permissions: vec!["stock-transfer:read".to_string()],
            exp: chrono::Utc::now().timestamp() + 60,
            iat: chrono::Utc::now().timestamp(),
        },
        &EncodingKey::from_secret(b"not-the-secret"),
    )
    .unwrap();

    let response = app()
        .oneshot(get("/api/v1/number-sequences", Some(&forged)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_permission_is_forbidden() {
    let t = token(&["stock-transfer:read"]);
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/stock-transfers/1/approve")
        .header(header::AUTHORIZATION, format!("Bearer {}", t))
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(response).await, "FORBIDDEN");
}

#[tokio::test]
async fn test_ledger_routes_require_ledger_permission() {
    let t = token(&["stock-adjustment:read"]);
    let response = app()
        .oneshot(get("/api/v1/stock-ledger/available?product_id=1&warehouse_id=1", Some(&t)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[test]
fn test_root_is_public() {
    tokio_test::block_on(async {
        let response = app().oneshot(get("/", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    });
}
