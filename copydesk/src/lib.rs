//! # copydesk: a role-gated article publishing backend
//!
//! `copydesk` is a small content-publishing service with a moderation
//! workflow. Users register, authenticate, and hold roles (admin, moderator,
//! writer, reader) that gate what they can do: writers draft articles and
//! invite co-authors and editors, creators publish drafts for review,
//! moderators approve or reject published articles, and readers comment on
//! approved ones. Commentaries pass through the same review gate before they
//! become visible on the article.
//!
//! ## Architecture
//!
//! The interesting part is the **policy layer** ([`policy`]): every gated
//! operation is a pure function over immutable snapshots of the caller and
//! the entity, answering "may this actor perform this operation on this
//! entity in its current state?". Handlers load the entity, consult the
//! policy, and only then write. Keeping the decisions out of the handlers
//! makes the whole permission matrix unit-testable without a database.
//!
//! Around it sits standard plumbing:
//!
//! - **API layer** ([`api`]): axum handlers under `/api/v1/*`, documented
//!   with utoipa and served as a Scalar page at `/docs`.
//! - **Authentication** ([`auth`]): Argon2id password hashes and short-lived
//!   JWT bearer tokens. Tokens carry only the user id; roles and activation
//!   are re-read from the database on every request.
//! - **Database layer** ([`db`]): PostgreSQL via sqlx, one repository per
//!   entity. Multi-write operations (create article + creator author link,
//!   reject article + rejection commentary) run in a single transaction.
//!
//! ## Quick start
//!
//! ```no_run
//! use clap::Parser;
//! use copydesk::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = copydesk::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     copydesk::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod policy;
pub mod telemetry;
mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use crate::{
    api::models::users::Role,
    auth::password,
    config::CorsOrigin,
    db::handlers::{Repository, Users},
    db::models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    openapi::ApiDoc,
};
use axum::http::HeaderValue;
use axum::{
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{debug, info, instrument, Level};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use config::Config;
pub use types::{ArticleId, CommentaryId, UserId};

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

/// Get the copydesk database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user if it doesn't exist.
///
/// Idempotent: creates the user with the admin role on first startup, and
/// refreshes the password on later startups so a rotated
/// `COPYDESK_ADMIN_PASSWORD` takes effect. Returns the admin's user id.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(username: &str, email: &str, password: &str, db: &PgPool) -> anyhow::Result<UserId> {
    let password_hash = password::hash_string(password).map_err(|e| anyhow::anyhow!("Failed to hash admin password: {e}"))?;

    let mut tx = db.begin().await?;
    let mut user_repo = Users::new(&mut tx);

    if let Some(existing) = user_repo.get_by_username(username).await? {
        user_repo
            .update(
                existing.id,
                &UserUpdateDBRequest {
                    password_hash: Some(password_hash),
                    ..Default::default()
                },
            )
            .await?;
        tx.commit().await?;
        return Ok(existing.id);
    }

    let created = user_repo
        .create(&UserCreateDBRequest {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: Some(password_hash),
            roles: vec![Role::Admin],
        })
        .await?;

    tx.commit().await?;
    info!("Created initial admin user '{username}'");
    Ok(created.id)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.security.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut exposed = Vec::new();
    for header in &config.auth.security.cors.exposed_headers {
        exposed.push(header.parse::<axum::http::HeaderName>()?);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.auth.security.cors.allow_credentials)
        .expose_headers(exposed);

    if let Some(max_age) = config.auth.security.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router: the `/api/v1` surface, the Scalar docs
/// page, a health probe, CORS, and request tracing.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let api_routes = Router::new()
        // Registration and login (open, no bearer token)
        .route("/auth/register", post(api::handlers::auth::register))
        .route("/auth/login", post(api::handlers::auth::login))
        // Users and role administration
        .route("/users", get(api::handlers::users::list_users))
        .route("/users/me", get(api::handlers::users::me))
        .route("/users/{id}", patch(api::handlers::users::update_user))
        .route(
            "/users/{id}/roles/{role}",
            post(api::handlers::users::add_role).delete(api::handlers::users::remove_role),
        )
        // Article workflow
        .route(
            "/articles",
            post(api::handlers::articles::create_article).get(api::handlers::articles::list_articles),
        )
        .route(
            "/articles/{id}",
            get(api::handlers::articles::get_article).patch(api::handlers::articles::update_article),
        )
        .route("/articles/{id}/publish", post(api::handlers::articles::publish_article))
        .route("/articles/{id}/unpublish", post(api::handlers::articles::unpublish_article))
        .route("/articles/{id}/approve", post(api::handlers::articles::approve_article))
        .route("/articles/{id}/reject", post(api::handlers::articles::reject_article))
        .route(
            "/articles/{id}/authors/{user_id}",
            post(api::handlers::articles::add_author).delete(api::handlers::articles::remove_author),
        )
        .route(
            "/articles/{id}/editors/{user_id}",
            post(api::handlers::articles::add_editor).delete(api::handlers::articles::remove_editor),
        )
        // Commentary workflow
        .route("/articles/{id}/commentaries", post(api::handlers::commentaries::create_commentary))
        .route("/commentaries/{id}", get(api::handlers::commentaries::get_commentary))
        .route("/commentaries/{id}/approve", post(api::handlers::commentaries::approve_commentary))
        .route("/commentaries/{id}/reject", post(api::handlers::commentaries::reject_commentary))
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api/v1", api_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    let cors_layer = create_cors_layer(&state.config)?;

    let router = router.layer(cors_layer).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns the router, configuration, and
/// database pool.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] connects to the database, runs
///    migrations, and bootstraps the admin user.
/// 2. **Serve**: [`Application::serve`] binds a TCP port and handles
///    requests until the shutdown future resolves.
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting copydesk with configuration: {:#?}", config);

        let pool_settings = &config.database.pool;
        let mut options = sqlx::postgres::PgPoolOptions::new()
            .max_connections(pool_settings.max_connections)
            .min_connections(pool_settings.min_connections)
            .acquire_timeout(std::time::Duration::from_secs(pool_settings.acquire_timeout_secs));
        if pool_settings.idle_timeout_secs > 0 {
            options = options.idle_timeout(std::time::Duration::from_secs(pool_settings.idle_timeout_secs));
        }
        if pool_settings.max_lifetime_secs > 0 {
            options = options.max_lifetime(std::time::Duration::from_secs(pool_settings.max_lifetime_secs));
        }
        let pool = options.connect(&config.database.url).await?;

        migrator().run(&pool).await?;

        Self::new_with_pool(config, pool).await
    }

    /// Create an application on an existing pool (migrations already applied)
    pub async fn new_with_pool(config: Config, pool: PgPool) -> anyhow::Result<Self> {
        if let Some(admin_password) = config.admin_password.as_deref() {
            create_initial_admin_user(&config.admin_username, &config.admin_email, admin_password, &pool).await?;
        }

        let state = AppState {
            db: pool.clone(),
            config: config.clone(),
        };
        let router = build_router(&state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(any(test, feature = "test-utils"))]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("copydesk listening on http://{bind_addr}");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::create_initial_admin_user;
    use crate::{api::models::users::Role, test_utils::*};
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_admin_bootstrap_is_idempotent(pool: PgPool) {
        let first = create_initial_admin_user("admin", "admin@example.com", "first-password", &pool)
            .await
            .unwrap();
        let second = create_initial_admin_user("admin", "admin@example.com", "rotated-password", &pool)
            .await
            .unwrap();
        assert_eq!(first, second);

        // The rotated password is the one that works
        let server = create_test_app(pool).await;
        server
            .post("/api/v1/auth/login")
            .json(&json!({"username": "admin", "password": "first-password"}))
            .await
            .assert_status(axum::http::StatusCode::UNAUTHORIZED);

        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({"username": "admin", "password": "rotated-password"}))
            .await;
        response.assert_status_ok();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_bootstrapped_admin_holds_admin_role(pool: PgPool) {
        create_initial_admin_user("admin", "admin@example.com", "bootstrap-password", &pool)
            .await
            .unwrap();

        let server = create_test_app(pool.clone()).await;
        let reader = create_test_user(&pool, vec![Role::Reader]).await;

        let token: serde_json::Value = server
            .post("/api/v1/auth/login")
            .json(&json!({"username": "admin", "password": "bootstrap-password"}))
            .await
            .json();
        let bearer = format!("Bearer {}", token["access_token"].as_str().unwrap());

        // Admin-only operation succeeds for the bootstrapped user
        server
            .post(&format!("/api/v1/users/{}/roles/writer", reader.id))
            .add_header("authorization", bearer)
            .await
            .assert_status_ok();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_requests_without_token_are_unauthenticated(pool: PgPool) {
        let server = create_test_app(pool).await;
        server.get("/api/v1/users/me").await.assert_status(axum::http::StatusCode::UNAUTHORIZED);
        server.get("/api/v1/articles?filter=approved").await.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_healthz(pool: PgPool) {
        let server = create_test_app(pool).await;
        let response = server.get("/healthz").await;
        response.assert_status_ok();
        response.assert_text("OK");
    }
}
