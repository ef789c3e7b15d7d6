#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::middleware::Logger;
use actix_web::{test, web, App};
use serde_json::{json, Value};
use taskgate::auth::{PasswordHasher, TokenIssuer};
use taskgate::cache::{MemoryStore, SessionCache};
use taskgate::routes;
use taskgate::store::{MemoryCredentialStore, MemoryTaskStore};
use taskgate::AppState;

pub const SECRET: &str = "integration-test-secret";

/// In-memory application state plus a handle on the raw key-value store behind
/// the session cache, so tests can inspect what login and logout wrote.
pub struct TestContext {
    pub state: web::Data<AppState>,
    pub kv: Arc<MemoryStore>,
}

pub fn context() -> TestContext {
    context_with_ttl(Duration::from_secs(300))
}

pub fn context_with_ttl(token_ttl: Duration) -> TestContext {
    let kv = Arc::new(MemoryStore::new());
    let state = AppState {
        users: Arc::new(MemoryCredentialStore::new()),
        tasks: Arc::new(MemoryTaskStore::new()),
        sessions: SessionCache::new(kv.clone()),
        tokens: TokenIssuer::new(SECRET, token_ttl),
        // Lowest bcrypt cost keeps the suite fast.
        hasher: PasswordHasher::new(4),
    };
    TestContext {
        state: web::Data::new(state),
        kv,
    }
}

pub async fn init_app(
    state: web::Data<AppState>,
) -> impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>
{
    test::init_service(
        App::new()
            .app_data(state)
            .app_data(routes::json_config())
            .wrap(Logger::default())
            .configure(routes::config),
    )
    .await
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

pub async fn register<S, B>(app: &S, username: &str, email: &str, password: &str) -> ServiceResponse<B>
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(json!({
            "username": username,
            "email": email,
            "password": password
        }))
        .to_request();
    test::call_service(app, req).await
}

pub async fn login<S, B>(app: &S, username: &str, password: &str) -> ServiceResponse<B>
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({
            "username": username,
            "password": password
        }))
        .to_request();
    test::call_service(app, req).await
}

/// Registers and logs in a user, returning the token.
pub async fn signed_in<S, B>(app: &S, username: &str) -> String
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let email = format!("{}@example.com", username);
    let resp = register(app, username, &email, "secret1").await;
    assert!(resp.status().is_success(), "Setup: failed to register {}", username);

    let resp = login(app, username, "secret1").await;
    assert!(resp.status().is_success(), "Setup: failed to log in {}", username);
    let body: Value = test::read_body_json(resp).await;
    body["token"]
        .as_str()
        .expect("login response has a token")
        .to_string()
}
