use crate::db::errors::DbError;
use crate::{
    api::models::users::CurrentUser,
    auth::session,
    db::handlers::{Repository, Users},
    errors::{Error, Result},
    AppState,
};
use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{debug, instrument, trace};

/// Extract the bearer token from the Authorization header if present
/// Returns:
/// - None: No Authorization header or not a Bearer token
/// - Some(Ok(token)): Bearer token present
/// - Some(Err(error)): Authorization header present but malformed
fn bearer_token(parts: &Parts) -> Option<Result<&str>> {
    let auth_header = parts.headers.get(axum::http::header::AUTHORIZATION)?;

    let auth_str = match auth_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid authorization header: {e}"),
            }))
        }
    };

    auth_str.strip_prefix("Bearer ").map(Ok)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    /// Authenticate a request from its `Authorization: Bearer <jwt>` header.
    ///
    /// The token only names a user id; roles and activation state are looked
    /// up fresh from the database. Inactive users are rejected with a 400
    /// even when their token is otherwise valid.
    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = match bearer_token(parts) {
            Some(Ok(token)) => token,
            Some(Err(e)) => return Err(e),
            None => {
                trace!("No bearer token found in request");
                return Err(Error::Unauthenticated { message: None });
            }
        };

        let user_id = session::verify_session_token(token, &state.config)?;

        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        let mut users = Users::new(&mut conn);
        let user = users
            .get_by_id(user_id)
            .await?
            .ok_or(Error::Unauthenticated { message: None })?;

        if !user.is_active {
            return Err(Error::BadRequest {
                message: "Inactive user".to_string(),
            });
        }

        debug!("Found JWT session authenticated user: {}", user.id);
        Ok(CurrentUser::from(user))
    }
}
