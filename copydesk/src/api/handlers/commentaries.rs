use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    api::models::{
        commentaries::{CommentaryCreate, CommentaryResponse, CommentaryState},
        users::CurrentUser,
    },
    db::{
        handlers::{Articles, Commentaries, Repository},
        models::commentaries::{CommentaryCreateDBRequest, CommentaryUpdateDBRequest},
    },
    errors::Error,
    policy::{self, Actor, ArticleView, CommentaryView},
    AppState,
};

fn commentary_not_found(id: Uuid) -> Error {
    Error::NotFound {
        resource: "Commentary".to_string(),
        id: id.to_string(),
    }
}

/// Comment on an approved article
#[utoipa::path(
    post,
    path = "/articles/{id}/commentaries",
    tag = "commentaries",
    request_body = CommentaryCreate,
    params(("id" = Uuid, Path, description = "Article ID")),
    responses(
        (status = 201, description = "Commentary submitted", body = CommentaryResponse),
        (status = 403, description = "Caller is not a reader or admin"),
        (status = 404, description = "Article not found"),
        (status = 409, description = "Article is not approved"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn create_commentary(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<CommentaryCreate>,
) -> Result<(StatusCode, Json<CommentaryResponse>), Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut articles = Articles::new(&mut conn);
    let article = articles.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Article".to_string(),
        id: id.to_string(),
    })?;

    policy::commentaries::create(&Actor::from(&current_user), &ArticleView::from(&article))?;

    let mut commentaries = Commentaries::new(&mut conn);
    let commentary = commentaries
        .create(&CommentaryCreateDBRequest {
            content: request.content,
            state: CommentaryState::Published,
            creator_id: current_user.id,
            article_id: id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(CommentaryResponse::from(commentary))))
}

/// Get a commentary by id
#[utoipa::path(
    get,
    path = "/commentaries/{id}",
    tag = "commentaries",
    params(("id" = Uuid, Path, description = "Commentary ID")),
    responses(
        (status = 200, description = "The commentary", body = CommentaryResponse),
        (status = 403, description = "No read access in the commentary's current state"),
        (status = 404, description = "Commentary not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn get_commentary(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CommentaryResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut commentaries = Commentaries::new(&mut conn);
    let commentary = commentaries.get_by_id(id).await?.ok_or_else(|| commentary_not_found(id))?;

    policy::commentaries::read(&Actor::from(&current_user), &CommentaryView::from(&commentary))?;

    Ok(Json(CommentaryResponse::from(commentary)))
}

/// Approve a published commentary
#[utoipa::path(
    post,
    path = "/commentaries/{id}/approve",
    tag = "commentaries",
    params(("id" = Uuid, Path, description = "Commentary ID")),
    responses(
        (status = 200, description = "Approved commentary", body = CommentaryResponse),
        (status = 403, description = "Caller is not a moderator or admin"),
        (status = 404, description = "Commentary not found"),
        (status = 409, description = "Commentary is not published"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn approve_commentary(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CommentaryResponse>, Error> {
    moderate(&state, &current_user, id, CommentaryState::Approved).await
}

/// Reject a published commentary
#[utoipa::path(
    post,
    path = "/commentaries/{id}/reject",
    tag = "commentaries",
    params(("id" = Uuid, Path, description = "Commentary ID")),
    responses(
        (status = 200, description = "Rejected commentary", body = CommentaryResponse),
        (status = 403, description = "Caller is not a moderator or admin"),
        (status = 404, description = "Commentary not found"),
        (status = 409, description = "Commentary is not published"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn reject_commentary(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CommentaryResponse>, Error> {
    moderate(&state, &current_user, id, CommentaryState::Rejected).await
}

/// Shared fetch-check-set-state flow for commentary moderation
async fn moderate(
    state: &AppState,
    current_user: &CurrentUser,
    id: Uuid,
    target: CommentaryState,
) -> Result<Json<CommentaryResponse>, Error> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut commentaries = Commentaries::new(&mut tx);
    let commentary = commentaries.get_by_id(id).await?.ok_or_else(|| commentary_not_found(id))?;

    policy::commentaries::moderate(&Actor::from(current_user), &CommentaryView::from(&commentary))?;

    let updated = commentaries.update(id, &CommentaryUpdateDBRequest { state: target }).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(CommentaryResponse::from(updated)))
}
