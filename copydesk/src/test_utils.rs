//! Test utilities for integration testing (available with `test-utils` feature).

use crate::{
    api::models::users::{Role, UserResponse},
    auth::session,
    config::{AuthConfig, Config, PasswordConfig},
    db::{
        handlers::{Repository, Users},
        models::users::UserCreateDBRequest,
    },
};
use axum_test::TestServer;
use sqlx::PgPool;
use uuid::Uuid;

/// Build an application on the given pool (migrated by `#[sqlx::test]`) and
/// wrap it in a test server.
pub async fn create_test_app(pool: PgPool) -> TestServer {
    let config = create_test_config();

    let app = crate::Application::new_with_pool(config, pool)
        .await
        .expect("Failed to create application");

    app.into_test_server()
}

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        admin_password: None,
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        auth: AuthConfig {
            password: PasswordConfig {
                // Weak parameters so hashing doesn't dominate test runtime
                argon2_memory_kib: 1024,
                argon2_iterations: 1,
                argon2_parallelism: 1,
                ..Default::default()
            },
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Insert a user with the given roles directly into the database
pub async fn create_test_user(pool: &PgPool, roles: Vec<Role>) -> UserResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut users_repo = Users::new(&mut conn);
    let user_id = Uuid::new_v4();
    let username = format!("testuser_{}", user_id.simple());
    let email = format!("{username}@example.com");

    let user_create = UserCreateDBRequest {
        username,
        email,
        password_hash: None,
        roles,
    };

    let user = users_repo.create(&user_create).await.expect("Failed to create test user");
    UserResponse::from(user)
}

/// Authorization header value carrying a fresh session token for the user
pub fn bearer_for(user: &UserResponse) -> String {
    let token = session::create_session_token(user.id, &create_test_config()).expect("Failed to create session token");
    format!("Bearer {token}")
}

/// Create a draft article through the API, returning the response body
pub async fn create_test_article(server: &TestServer, creator: &UserResponse) -> serde_json::Value {
    let response = server
        .post("/api/v1/articles")
        .add_header("authorization", bearer_for(creator))
        .json(&serde_json::json!({
            "name": "Test article",
            "content": "Some draft content",
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json()
}
