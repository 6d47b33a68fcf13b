//! API integration tests
//!
//! Requests go through the full router (guard, extractors, error bodies)
//! backed by the in-memory stores and a clock the tests can move.

use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, Utc};
use jsonwebtoken::EncodingKey;
use mockable::Clock;
use serde_json::{json, Value};
use tower::ServiceExt;

use bookshelf_server::{
    api,
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        user::{NewUser, User},
        Role, UserClaims,
    },
    repository::{Repository, UserStore},
    services::Services,
    AppState,
};

struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    fn advance(&self, delta: Duration) {
        *self.0.lock().unwrap() += delta;
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

struct TestApp {
    router: Router,
    clock: Arc<MutableClock>,
    repository: Repository,
}

impl TestApp {
    fn new() -> Self {
        Self::with_repository(Repository::in_memory())
    }

    fn with_repository(repository: Repository) -> Self {
        let clock = Arc::new(MutableClock(Mutex::new(Utc::now())));
        let auth = AuthConfig {
            jwt_secret: "test-secret".to_string(),
            jwt_expiration_hours: 24,
        };
        let services = Services::new(repository.clone(), &auth, clock.clone());

        Self {
            router: api::create_router(AppState::new(services)),
            clock,
            repository,
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn register(&self, username: &str, email: &str, role: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/users/register",
            None,
            Some(json!({
                "username": username,
                "email": email,
                "password": "p",
                "role": role
            })),
        )
        .await
    }

    /// Register and log in, returning the bearer token
    async fn token_for(&self, username: &str, role: &str) -> String {
        let (status, _) = self
            .register(username, &format!("{}@x.com", username), role)
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self
            .send(
                Method::POST,
                "/users/login",
                None,
                Some(json!({ "username": username, "password": "p" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().expect("token").to_string()
    }
}

/// Credential store whose lookups miss while the insert trips the unique
/// index, as when a concurrent registration commits first
struct LateDuplicateUsers;

#[async_trait]
impl UserStore for LateDuplicateUsers {
    async fn find_by_username(&self, _username: &str) -> AppResult<Option<User>> {
        Ok(None)
    }

    async fn find_by_email(&self, _email: &str) -> AppResult<Option<User>> {
        Ok(None)
    }

    async fn create(&self, _user: &NewUser) -> AppResult<User> {
        Err(AppError::Conflict("username or email already exists".to_string()))
    }
}

fn dune() -> Value {
    json!({
        "name": "Dune",
        "genre": "SciFi",
        "author": "Herbert",
        "published_date": "1965",
        "stock": 5,
        "price": 9.99
    })
}

#[tokio::test]
async fn test_register_login_create_scenario() {
    let app = TestApp::new();

    let (status, body) = app.register("alice", "a@x.com", "Admin").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["id"], 1);
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["email"], "a@x.com");
    assert_eq!(body["data"]["role"], "Admin");
    assert!(body["data"].get("password").is_none());
    assert!(body["data"].get("password_hash").is_none());

    let (status, body) = app
        .send(
            Method::POST,
            "/users/login",
            None,
            Some(json!({ "username": "alice", "password": "p" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 24 * 3600);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = app.send(Method::POST, "/books", Some(&token), Some(dune())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["id"], 1);
    assert_eq!(body["data"]["stock"], 5);
    assert_eq!(body["data"]["price"], 9.99);
}

#[tokio::test]
async fn test_register_missing_field_persists_nothing() {
    let app = TestApp::new();
    let complete = json!({
        "username": "alice",
        "email": "a@x.com",
        "password": "p",
        "role": "Admin"
    });

    for field in ["username", "email", "password", "role"] {
        let mut payload = complete.clone();
        payload.as_object_mut().unwrap().remove(field);

        let (status, body) = app
            .send(Method::POST, "/users/register", None, Some(payload))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "missing {}", field);
        assert_eq!(body["error"], "ValidationError");
    }

    let stored = app.repository.users.find_by_username("alice").await.unwrap();
    assert!(stored.is_none());
}

#[tokio::test]
async fn test_register_rejects_bad_email_and_role() {
    let app = TestApp::new();

    let (status, _) = app.register("alice", "not-an-email", "Admin").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.register("alice", "a@x.com", "admin").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "invalid role");

    let (status, body) = app.send(Method::POST, "/users/register", None, Some(json!("nope"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ValidationError");
}

#[tokio::test]
async fn test_duplicate_username_or_email_conflicts() {
    let app = TestApp::new();
    let (status, _) = app.register("alice", "a@x.com", "Admin").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.register("alice", "other@x.com", "Customer").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "ConflictError");

    let (status, _) = app.register("bob", "a@x.com", "Customer").await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_login_failures() {
    let app = TestApp::new();
    app.register("alice", "a@x.com", "Admin").await;

    let (status, _) = app
        .send(
            Method::POST,
            "/users/login",
            None,
            Some(json!({ "username": "nobody", "password": "p" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .send(
            Method::POST,
            "/users/login",
            None,
            Some(json!({ "username": "alice", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "invalid password");

    let (status, _) = app
        .send(Method::POST, "/users/login", None, Some(json!({ "username": "alice" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_token_expires_after_24_hours() {
    let app = TestApp::new();
    let token = app.token_for("carol", "Customer").await;

    app.clock.advance(Duration::hours(23));
    let (status, _) = app.send(Method::GET, "/books", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    app.clock.advance(Duration::hours(1) + Duration::seconds(1));
    let (status, body) = app.send(Method::GET, "/books", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UnauthorizedError");
}

#[tokio::test]
async fn test_missing_or_invalid_token_is_rejected() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::GET, "/books", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UnauthorizedError");

    let (status, _) = app.send(Method::GET, "/books/1", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/books")
        .header(header::AUTHORIZATION, "Token abc")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Unauthenticated writes are refused before the body is looked at
    let (status, _) = app.send(Method::POST, "/books", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_customer_can_read_but_not_write() {
    let app = TestApp::new();
    let admin = app.token_for("alice", "Admin").await;
    let customer = app.token_for("carol", "Customer").await;

    let (status, _) = app.send(Method::POST, "/books", Some(&admin), Some(dune())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.send(Method::POST, "/books", Some(&customer), Some(dune())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "need admin role to perform this action");

    let (status, _) = app.send(Method::PUT, "/books/1", Some(&customer), Some(dune())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send(Method::DELETE, "/books/1", Some(&customer), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.send(Method::GET, "/books", Some(&customer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = app.send(Method::GET, "/books/1", Some(&customer), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_created_book_reads_back_unchanged() {
    let app = TestApp::new();
    let token = app.token_for("alice", "Admin").await;

    let (_, created) = app.send(Method::POST, "/books", Some(&token), Some(dune())).await;
    let id = created["data"]["id"].as_i64().unwrap();
    assert!(id > 0);

    let (status, book) = app
        .send(Method::GET, &format!("/books/{}", id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    for (field, value) in dune().as_object().unwrap() {
        assert_eq!(&book[field], value, "field {}", field);
    }
    assert!(book["created_at"].is_string());
    assert!(book["updated_at"].is_string());
    assert_eq!(book, created["data"]);
}

#[tokio::test]
async fn test_book_validation() {
    let app = TestApp::new();
    let token = app.token_for("alice", "Admin").await;

    let mut missing_stock = dune();
    missing_stock.as_object_mut().unwrap().remove("stock");
    let (status, body) = app
        .send(Method::POST, "/books", Some(&token), Some(missing_stock))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ValidationError");

    let mut empty_name = dune();
    empty_name["name"] = json!("");
    let (status, _) = app.send(Method::POST, "/books", Some(&token), Some(empty_name)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut zero_stock = dune();
    zero_stock["stock"] = json!(0);
    let (status, body) = app.send(Method::POST, "/books", Some(&token), Some(zero_stock)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["stock"], 0);

    let (status, _) = app.send(Method::GET, "/books/abc", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_book() {
    let app = TestApp::new();
    let token = app.token_for("alice", "Admin").await;
    app.send(Method::POST, "/books", Some(&token), Some(dune())).await;

    let mut changed = dune();
    changed["stock"] = json!(12);
    changed["price"] = json!(14.5);
    changed["name"] = json!("Dune Messiah");

    let (status, body) = app
        .send(Method::PUT, "/books/1", Some(&token), Some(changed.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], 1);
    assert_eq!(body["data"]["name"], "Dune Messiah");
    assert_eq!(body["data"]["stock"], 12);
    assert_eq!(body["data"]["price"], 14.5);

    let (status, _) = app
        .send(Method::PUT, "/books/99", Some(&token), Some(changed.clone()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(Method::PUT, "/books/one", Some(&token), Some(changed))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_book() {
    let app = TestApp::new();
    let token = app.token_for("alice", "Admin").await;

    let (status, body) = app.send(Method::DELETE, "/books/1", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFoundError");

    app.send(Method::POST, "/books", Some(&token), Some(dune())).await;

    let (status, body) = app.send(Method::DELETE, "/books/1", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully deleted book with ID 1");

    let (status, _) = app.send(Method::GET, "/books/1", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.send(Method::GET, "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_register_conflict_detected_on_insert() {
    let mut repository = Repository::in_memory();
    repository.users = Arc::new(LateDuplicateUsers);
    let app = TestApp::with_repository(repository);

    let (status, body) = app.register("alice", "a@x.com", "Admin").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "ConflictError");
    assert_eq!(body["message"], "username or email already exists");
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let app = TestApp::new();
    app.token_for("alice", "Admin").await;

    let now = app.clock.utc().timestamp();
    let forged = UserClaims {
        sub: "1".to_string(),
        user_id: 1,
        role: Role::Admin,
        exp: now + 3600,
        iat: now,
    }
    .create_token(&EncodingKey::from_secret(b"another-secret"))
    .unwrap();

    let (status, body) = app.send(Method::GET, "/books", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UnauthorizedError");
}

#[tokio::test]
async fn test_price_outside_stored_precision_is_rejected() {
    let app = TestApp::new();
    let token = app.token_for("alice", "Admin").await;

    for price in [json!(0.005), json!(9.999), json!(123_456_789_012.5)] {
        let mut book = dune();
        book["price"] = price.clone();
        let (status, body) = app.send(Method::POST, "/books", Some(&token), Some(book)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "price {}", price);
        assert_eq!(body["error"], "ValidationError");
    }

    let (_, books) = app.send(Method::GET, "/books", Some(&token), None).await;
    assert_eq!(books, json!([]));

    let mut book = dune();
    book["price"] = json!(9_999_999_999.99);
    let (status, body) = app.send(Method::POST, "/books", Some(&token), Some(book)).await;
    assert_eq!(status, StatusCode::CREATED);
    let stored = body["data"]["price"].as_f64().unwrap();
    assert!((stored - 9_999_999_999.99).abs() < 1e-3);
}
