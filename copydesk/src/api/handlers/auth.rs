use axum::{extract::State, http::StatusCode, Json};

use crate::{
    api::models::{
        auth::{LoginRequest, RegisterRequest, TokenResponse},
        users::{Role, UserResponse},
    },
    auth::{password, session},
    db::{
        handlers::{Repository, Users},
        models::users::UserCreateDBRequest,
    },
    errors::Error,
    AppState,
};

/// Register a new user account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    tag = "authentication",
    responses(
        (status = 201, description = "User registered successfully", body = UserResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username already taken"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), Error> {
    // Check if registration is allowed
    if !state.config.auth.allow_registration {
        return Err(Error::BadRequest {
            message: "User registration is disabled".to_string(),
        });
    }

    // Validate password length
    let password_config = &state.config.auth.password;
    if request.password.len() < password_config.min_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {} characters", password_config.min_length),
        });
    }
    if request.password.len() > password_config.max_length {
        return Err(Error::BadRequest {
            message: format!("Password must be no more than {} characters", password_config.max_length),
        });
    }

    // Hash the password on a blocking thread to avoid blocking async runtime
    let password = request.password.clone();
    let params = password_config.argon2_params();
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string_with_params(&password, Some(params)))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    let create_request = UserCreateDBRequest {
        username: request.username,
        email: request.email,
        password_hash: Some(password_hash),
        roles: vec![Role::Reader],
    };

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut tx);
    // A duplicate username surfaces as a unique violation and maps to 409
    let created_user = user_repo.create(&create_request).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(created_user))))
}

/// Login with username and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Json<TokenResponse>, Error> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut pool_conn);

    // Find user by username
    let user = user_repo
        .get_by_username(&request.username)
        .await?
        .ok_or_else(|| Error::Unauthenticated {
            message: Some("Invalid username or password".to_string()),
        })?;

    // Check if user has a password set
    let password_hash = user.password_hash.as_ref().ok_or_else(|| Error::Unauthenticated {
        message: Some("Invalid username or password".to_string()),
    })?;

    // Verify password on a blocking thread to avoid blocking async runtime
    let password = request.password.clone();
    let hash = password_hash.clone();
    let is_valid = tokio::task::spawn_blocking(move || password::verify_string(&password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !is_valid {
        return Err(Error::Unauthenticated {
            message: Some("Invalid username or password".to_string()),
        });
    }

    if !user.is_active {
        return Err(Error::BadRequest {
            message: "Inactive user".to_string(),
        });
    }

    let token = session::create_session_token(user.id, &state.config)?;

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        expires_in: state.config.auth.security.jwt_expiry.as_secs(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::*;
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_and_login(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server
            .post("/api/v1/auth/register")
            .json(&json!({
                "username": "newwriter",
                "email": "newwriter@example.com",
                "password": "a-long-password",
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["username"], "newwriter");
        // New registrations start as readers
        assert_eq!(body["roles"], json!(["reader"]));

        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({
                "username": "newwriter",
                "password": "a-long-password",
            }))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["token_type"], "bearer");
        assert!(!body["access_token"].as_str().unwrap().is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_duplicate_username_conflicts(pool: PgPool) {
        let server = create_test_app(pool).await;

        let request = json!({
            "username": "duplicate",
            "email": "first@example.com",
            "password": "a-long-password",
        });
        server.post("/api/v1/auth/register").json(&request).await.assert_status(axum::http::StatusCode::CREATED);

        let response = server.post("/api/v1/auth/register").json(&request).await;
        response.assert_status(axum::http::StatusCode::CONFLICT);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_rejects_short_password(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server
            .post("/api/v1/auth/register")
            .json(&json!({
                "username": "shorty",
                "email": "shorty@example.com",
                "password": "tiny",
            }))
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_login_wrong_password_unauthorized(pool: PgPool) {
        let server = create_test_app(pool).await;

        server
            .post("/api/v1/auth/register")
            .json(&json!({
                "username": "someone",
                "email": "someone@example.com",
                "password": "a-long-password",
            }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({
                "username": "someone",
                "password": "wrong-password",
            }))
            .await;
        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);

        // Unknown usernames get the same response as bad passwords
        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({
                "username": "nobody",
                "password": "a-long-password",
            }))
            .await;
        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    }
}
