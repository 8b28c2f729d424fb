//! Integration test harness for dsc.
//!
//! Drives the real router in-process against [`MemoryDatabase`] and an
//! in-memory session store, so no server or `PostgreSQL` is needed. Tests
//! that exercise the `PostgreSQL` stores use [`postgres_database`] and are
//! skipped when no database URL is configured.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p dsc-integration-tests
//!
//! # Include the PostgreSQL store tests
//! DSC_DATABASE_URL=postgres://localhost/dsc_test cargo test -p dsc-integration-tests
//! ```
//!
//! The login flow lives outside this service, so the harness mounts a
//! `POST /test/login` route that writes a [`CurrentUser`] into the session
//! the same way the login service does.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    Json, Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
    routing::post,
};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, Session, SessionManagerLayer};

use dsc_api::config::{ApiConfig, DEFAULT_APP_NAME};
use dsc_api::db::{self, Database, MemoryDatabase, PgDatabase, ProfileStore};
use dsc_api::middleware::{session::SESSION_COOKIE_NAME, set_current_user};
use dsc_api::models::{CurrentUser, NewProfile, Profile};
use dsc_api::routes;
use dsc_api::state::AppState;
use dsc_core::{Authority, Login};

/// A response with its body decoded as JSON (`Value::Null` when empty).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// Header value as a string, if present and valid.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// An application instance with its own store and sessions.
pub struct TestContext {
    pub app: Router,
    pub database: Arc<dyn Database>,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    /// Build a fresh application over an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_database(Arc::new(MemoryDatabase::new()))
    }

    /// Build an application over the given store.
    #[must_use]
    pub fn with_database(database: Arc<dyn Database>) -> Self {
        let state = AppState::new(test_config(), Arc::clone(&database));

        let session_layer = SessionManagerLayer::new(MemoryStore::default())
            .with_name(SESSION_COOKIE_NAME)
            .with_secure(false);

        let app = routes::routes()
            .route("/test/login", post(test_login))
            .layer(session_layer)
            .with_state(state);

        Self { app, database }
    }

    /// Provision a profile directly in the store.
    ///
    /// # Panics
    ///
    /// Panics if the login is invalid or the store fails.
    pub async fn seed_profile(&self, login: &str) -> Profile {
        let mut tx = self.database.begin().await.expect("begin");
        let profile = tx
            .insert_profile(NewProfile {
                user_login: Login::parse(login).expect("valid login"),
                display_name: None,
            })
            .await
            .expect("insert profile");
        tx.commit().await.expect("commit");
        profile
    }

    /// All profiles stored for `login`.
    ///
    /// # Panics
    ///
    /// Panics if the login is invalid or the store fails.
    pub async fn profiles_of(&self, login: &str) -> Vec<Profile> {
        let mut tx = self.database.begin().await.expect("begin");
        tx.profiles_by_login(&Login::parse(login).expect("valid login"))
            .await
            .expect("profiles by login")
    }

    /// Sign in as a regular user and return the session cookie.
    pub async fn login_user(&self, login: &str) -> String {
        self.login(login, vec![Authority::User]).await
    }

    /// Sign in as an administrator and return the session cookie.
    pub async fn login_admin(&self, login: &str) -> String {
        self.login(login, vec![Authority::User, Authority::Admin])
            .await
    }

    /// Sign in with the given authorities and return the session cookie.
    ///
    /// # Panics
    ///
    /// Panics if the login route does not set a session cookie.
    pub async fn login(&self, login: &str, authorities: Vec<Authority>) -> String {
        let user = CurrentUser::new(Login::parse(login).expect("valid login"), authorities);
        let body = serde_json::to_value(&user).expect("serialize user");

        let response = self.send(Method::POST, "/test/login", None, Some(body)).await;
        assert_eq!(response.status, StatusCode::NO_CONTENT);

        let set_cookie = response
            .header(header::SET_COOKIE.as_str())
            .expect("session cookie");
        set_cookie
            .split(';')
            .next()
            .expect("cookie pair")
            .to_owned()
    }

    /// Send a request through the router.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("infallible router");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Connect to the test database and apply migrations.
///
/// Returns `None` when neither `DSC_DATABASE_URL` nor `DATABASE_URL` is set.
///
/// # Panics
///
/// Panics if the database is configured but unreachable, or a migration fails.
pub async fn postgres_database() -> Option<PgDatabase> {
    let url = std::env::var("DSC_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()?;

    let pool = db::create_pool(&SecretString::from(url))
        .await
        .expect("connect to test database");
    sqlx::migrate!("../api/migrations")
        .run(&pool)
        .await
        .expect("apply migrations");

    Some(PgDatabase::new(pool))
}

/// A login no other test run has used, for data that outlives a test.
#[must_use]
pub fn unique_login(prefix: &str) -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos());
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{nanos}-{n}")
}

fn test_config() -> ApiConfig {
    ApiConfig {
        database_url: SecretString::from("postgres://unused"),
        host: std::net::IpAddr::from([127, 0, 0, 1]),
        port: 8080,
        base_url: "http://localhost:8080".to_owned(),
        app_name: DEFAULT_APP_NAME.to_owned(),
        log_json: false,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 1.0,
    }
}

async fn test_login(session: Session, Json(user): Json<CurrentUser>) -> StatusCode {
    match set_current_user(&session, &user).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
