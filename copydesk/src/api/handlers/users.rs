use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::{
    api::models::{
        pagination::Pagination,
        users::{CurrentUser, ProfileResponse, Role, UserResponse, UserUpdate},
    },
    db::{
        handlers::{users::UserFilter, Articles, Commentaries, Repository, Users},
        models::users::UserUpdateDBRequest,
    },
    errors::Error,
    policy::{self, Actor},
    AppState,
};

/// Get the caller's own profile
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "users",
    responses(
        (status = 200, description = "Current user profile", body = ProfileResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn me(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<ProfileResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut articles = Articles::new(&mut conn);
    let created_articles = articles.ids_created_by(current_user.id).await?;
    let authored_articles = articles.ids_authored_by(current_user.id).await?;
    let edited_articles = articles.ids_edited_by(current_user.id).await?;

    let mut commentaries = Commentaries::new(&mut conn);
    let commentaries = commentaries.ids_by_creator(current_user.id).await?;

    Ok(Json(ProfileResponse {
        id: current_user.id,
        username: current_user.username,
        email: current_user.email,
        is_active: current_user.is_active,
        roles: current_user.roles,
        created_articles,
        authored_articles,
        edited_articles,
        commentaries,
    }))
}

/// List users (admin only)
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    params(Pagination),
    responses(
        (status = 200, description = "List of users", body = Vec<UserResponse>),
        (status = 403, description = "Not an admin"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn list_users(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<UserResponse>>, Error> {
    policy::users::manage_users(&Actor::from(&current_user))?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);
    let users = user_repo.list(&UserFilter::new(pagination.skip(), pagination.limit())).await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Update a user's activation state (admin only)
#[utoipa::path(
    patch,
    path = "/users/{id}",
    tag = "users",
    request_body = UserUpdate,
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn update_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UserUpdate>,
) -> Result<Json<UserResponse>, Error> {
    policy::users::manage_users(&Actor::from(&current_user))?;

    let update = UserUpdateDBRequest {
        is_active: request.is_active,
        ..Default::default()
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);
    let user = user_repo.update(id, &update).await.map_err(|e| match e {
        crate::db::errors::DbError::NotFound => Error::NotFound {
            resource: "User".to_string(),
            id: id.to_string(),
        },
        e => Error::Database(e),
    })?;

    Ok(Json(UserResponse::from(user)))
}

/// Grant a role to a user (admin only)
#[utoipa::path(
    post,
    path = "/users/{id}/roles/{role}",
    tag = "users",
    params(
        ("id" = Uuid, Path, description = "User ID"),
        ("role" = Role, Path, description = "Role to grant"),
    ),
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "User not found"),
        (status = 409, description = "User already has the role"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn add_role(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((id, role)): Path<(Uuid, Role)>,
) -> Result<Json<UserResponse>, Error> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut tx);

    let target = user_repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: id.to_string(),
    })?;

    policy::users::grant_role(&Actor::from(&current_user), &target.roles, role)?;

    user_repo.add_role(id, role).await?;
    let updated = user_repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: id.to_string(),
    })?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(UserResponse::from(updated)))
}

/// Revoke a role from a user (admin only)
#[utoipa::path(
    delete,
    path = "/users/{id}/roles/{role}",
    tag = "users",
    params(
        ("id" = Uuid, Path, description = "User ID"),
        ("role" = Role, Path, description = "Role to revoke"),
    ),
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "User not found"),
        (status = 409, description = "User does not have the role"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn remove_role(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((id, role)): Path<(Uuid, Role)>,
) -> Result<Json<UserResponse>, Error> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut tx);

    let target = user_repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: id.to_string(),
    })?;

    policy::users::revoke_role(&Actor::from(&current_user), &target.roles, role)?;

    user_repo.remove_role(id, role).await?;
    let updated = user_repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: id.to_string(),
    })?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(UserResponse::from(updated)))
}
