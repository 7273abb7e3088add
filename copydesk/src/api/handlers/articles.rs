use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    api::models::{
        articles::{
            ArticleCreate, ArticleListFilter, ArticleReject, ArticleResponse, ArticleState, ArticleUpdate, ListArticlesQuery,
        },
        commentaries::CommentaryState,
        users::{CurrentUser, Role},
    },
    db::{
        handlers::{Articles, Commentaries, Repository},
        models::{
            articles::{ArticleCreateDBRequest, ArticleUpdateDBRequest},
            commentaries::CommentaryCreateDBRequest,
        },
    },
    errors::Error,
    policy::{self, Actor, ArticleView},
    types::ArticleId,
    AppState,
};

fn article_not_found(id: Uuid) -> Error {
    Error::NotFound {
        resource: "Article".to_string(),
        id: id.to_string(),
    }
}

/// Create a new draft article
#[utoipa::path(
    post,
    path = "/articles",
    tag = "articles",
    request_body = ArticleCreate,
    responses(
        (status = 201, description = "Article created", body = ArticleResponse),
        (status = 403, description = "Caller is not a writer or admin"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn create_article(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<ArticleCreate>,
) -> Result<(StatusCode, Json<ArticleResponse>), Error> {
    policy::articles::create(&Actor::from(&current_user))?;

    let create_request = ArticleCreateDBRequest {
        name: request.name,
        content: request.content,
        creator_id: current_user.id,
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut articles = Articles::new(&mut conn);
    let article = articles.create(&create_request).await?;

    Ok((StatusCode::CREATED, Json(ArticleResponse::from(article))))
}

/// List article ids by relationship or state
#[utoipa::path(
    get,
    path = "/articles",
    tag = "articles",
    params(ListArticlesQuery),
    responses(
        (status = 200, description = "Article ids matching the filter", body = Vec<Uuid>),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id, filter = ?query.filter))]
pub async fn list_articles(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListArticlesQuery>,
) -> Result<Json<Vec<ArticleId>>, Error> {
    let actor = Actor::from(&current_user);
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut articles = Articles::new(&mut conn);

    let ids = match query.filter {
        ArticleListFilter::Approved => articles.approved_ids().await?,
        // Moderators and admins review the whole published queue, everyone
        // else only sees the published articles they author
        ArticleListFilter::Published => {
            if actor.has_any_role(&[Role::Moderator, Role::Admin]) {
                articles.published_ids().await?
            } else {
                articles.published_ids_authored_by(actor.id).await?
            }
        }
        ArticleListFilter::Created => articles.ids_created_by(actor.id).await?,
        ArticleListFilter::Authored => articles.ids_authored_by(actor.id).await?,
        ArticleListFilter::Edited => articles.ids_edited_by(actor.id).await?,
    };

    Ok(Json(ids))
}

/// Get an article by id
#[utoipa::path(
    get,
    path = "/articles/{id}",
    tag = "articles",
    params(("id" = Uuid, Path, description = "Article ID")),
    responses(
        (status = 200, description = "The article", body = ArticleResponse),
        (status = 403, description = "No read access in the article's current state"),
        (status = 404, description = "Article not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn get_article(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ArticleResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut articles = Articles::new(&mut conn);
    let article = articles.get_by_id(id).await?.ok_or_else(|| article_not_found(id))?;

    policy::articles::read(&Actor::from(&current_user), &ArticleView::from(&article))?;

    Ok(Json(ArticleResponse::from(article)))
}

/// Update a draft article's name or content
#[utoipa::path(
    patch,
    path = "/articles/{id}",
    tag = "articles",
    request_body = ArticleUpdate,
    params(("id" = Uuid, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Updated article", body = ArticleResponse),
        (status = 403, description = "Caller is not the creator, an author, or an editor"),
        (status = 404, description = "Article not found"),
        (status = 409, description = "Article is not a draft"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn update_article(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<ArticleUpdate>,
) -> Result<Json<ArticleResponse>, Error> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut articles = Articles::new(&mut tx);
    let article = articles.get_by_id(id).await?.ok_or_else(|| article_not_found(id))?;

    policy::articles::edit(&Actor::from(&current_user), &ArticleView::from(&article))?;

    let update = ArticleUpdateDBRequest {
        name: request.name,
        content: request.content,
    };
    let updated = articles.update(id, &update).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(ArticleResponse::from(updated)))
}

/// Submit a draft article for moderation
#[utoipa::path(
    post,
    path = "/articles/{id}/publish",
    tag = "articles",
    params(("id" = Uuid, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Published article", body = ArticleResponse),
        (status = 403, description = "Caller is not the creator"),
        (status = 404, description = "Article not found"),
        (status = 409, description = "Article is not a draft"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn publish_article(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ArticleResponse>, Error> {
    transition(&state, &current_user, id, ArticleState::Published, policy::articles::publish).await
}

/// Pull a published article back to draft
#[utoipa::path(
    post,
    path = "/articles/{id}/unpublish",
    tag = "articles",
    params(("id" = Uuid, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Article back in draft", body = ArticleResponse),
        (status = 403, description = "Caller is not the creator"),
        (status = 404, description = "Article not found"),
        (status = 409, description = "Article is not published"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn unpublish_article(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ArticleResponse>, Error> {
    transition(&state, &current_user, id, ArticleState::Draft, policy::articles::unpublish).await
}

/// Approve a published article
#[utoipa::path(
    post,
    path = "/articles/{id}/approve",
    tag = "articles",
    params(("id" = Uuid, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Approved article", body = ArticleResponse),
        (status = 403, description = "Caller is not a moderator or admin"),
        (status = 404, description = "Article not found"),
        (status = 409, description = "Article is not published"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn approve_article(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ArticleResponse>, Error> {
    transition(&state, &current_user, id, ArticleState::Approved, policy::articles::approve).await
}

/// Shared fetch-check-set-state flow for the simple transitions
async fn transition(
    state: &AppState,
    current_user: &CurrentUser,
    id: Uuid,
    target: ArticleState,
    check: impl Fn(&Actor, &ArticleView) -> policy::Decision,
) -> Result<Json<ArticleResponse>, Error> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut articles = Articles::new(&mut tx);
    let article = articles.get_by_id(id).await?.ok_or_else(|| article_not_found(id))?;

    check(&Actor::from(current_user), &ArticleView::from(&article))?;

    let updated = articles.set_state(id, target).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(ArticleResponse::from(updated)))
}

/// Reject a published article, attaching the rejection commentary
#[utoipa::path(
    post,
    path = "/articles/{id}/reject",
    tag = "articles",
    request_body = ArticleReject,
    params(("id" = Uuid, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Rejected article", body = ArticleResponse),
        (status = 403, description = "Caller is not a moderator or admin"),
        (status = 404, description = "Article not found"),
        (status = 409, description = "Article is not published"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn reject_article(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<ArticleReject>,
) -> Result<Json<ArticleResponse>, Error> {
    // The state change and the rejection commentary land in one transaction
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let mut articles = Articles::new(&mut tx);
    let article = articles.get_by_id(id).await?.ok_or_else(|| article_not_found(id))?;

    policy::articles::reject(&Actor::from(&current_user), &ArticleView::from(&article))?;

    let updated = articles.set_state(id, ArticleState::Rejected).await?;

    let mut commentaries = Commentaries::new(&mut tx);
    commentaries
        .create(&CommentaryCreateDBRequest {
            content: request.content,
            state: CommentaryState::RejectCommentary,
            creator_id: current_user.id,
            article_id: id,
        })
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(ArticleResponse::from(updated)))
}

/// Add an author to a draft article
#[utoipa::path(
    post,
    path = "/articles/{id}/authors/{user_id}",
    tag = "articles",
    params(
        ("id" = Uuid, Path, description = "Article ID"),
        ("user_id" = Uuid, Path, description = "User to add"),
    ),
    responses(
        (status = 200, description = "Updated article", body = ArticleResponse),
        (status = 403, description = "Caller is not the creator"),
        (status = 404, description = "Article or user not found"),
        (status = 409, description = "Not a draft, or user already an author"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn add_author(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ArticleResponse>, Error> {
    membership(&state, &current_user, id, user_id, policy::articles::add_author, |articles, id, user| {
        Box::pin(articles.add_author(id, user))
    })
    .await
}

/// Remove an author from a draft article
#[utoipa::path(
    delete,
    path = "/articles/{id}/authors/{user_id}",
    tag = "articles",
    params(
        ("id" = Uuid, Path, description = "Article ID"),
        ("user_id" = Uuid, Path, description = "User to remove"),
    ),
    responses(
        (status = 200, description = "Updated article", body = ArticleResponse),
        (status = 403, description = "Caller is not the creator"),
        (status = 404, description = "Article not found"),
        (status = 409, description = "Not a draft, not an author, or user is the creator"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn remove_author(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ArticleResponse>, Error> {
    membership(&state, &current_user, id, user_id, policy::articles::remove_author, |articles, id, user| {
        Box::pin(articles.remove_author(id, user))
    })
    .await
}

/// Add an editor to a draft article
#[utoipa::path(
    post,
    path = "/articles/{id}/editors/{user_id}",
    tag = "articles",
    params(
        ("id" = Uuid, Path, description = "Article ID"),
        ("user_id" = Uuid, Path, description = "User to add"),
    ),
    responses(
        (status = 200, description = "Updated article", body = ArticleResponse),
        (status = 403, description = "Caller is not the creator"),
        (status = 404, description = "Article or user not found"),
        (status = 409, description = "Not a draft, or user already an editor"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn add_editor(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ArticleResponse>, Error> {
    membership(&state, &current_user, id, user_id, policy::articles::add_editor, |articles, id, user| {
        Box::pin(articles.add_editor(id, user))
    })
    .await
}

/// Remove an editor from a draft article
#[utoipa::path(
    delete,
    path = "/articles/{id}/editors/{user_id}",
    tag = "articles",
    params(
        ("id" = Uuid, Path, description = "Article ID"),
        ("user_id" = Uuid, Path, description = "User to remove"),
    ),
    responses(
        (status = 200, description = "Updated article", body = ArticleResponse),
        (status = 403, description = "Caller is not the creator"),
        (status = 404, description = "Article not found"),
        (status = 409, description = "Not a draft, or user is not an editor"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn remove_editor(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ArticleResponse>, Error> {
    membership(&state, &current_user, id, user_id, policy::articles::remove_editor, |articles, id, user| {
        Box::pin(articles.remove_editor(id, user))
    })
    .await
}

type MembershipOp = for<'a, 'c> fn(
    &'a mut Articles<'c>,
    Uuid,
    Uuid,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = crate::db::errors::Result<()>> + Send + 'a>>;

/// Shared fetch-check-link flow for author/editor membership changes
async fn membership(
    state: &AppState,
    current_user: &CurrentUser,
    id: Uuid,
    user_id: Uuid,
    check: impl Fn(&Actor, &ArticleView, Uuid) -> policy::Decision,
    apply: MembershipOp,
) -> Result<Json<ArticleResponse>, Error> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut articles = Articles::new(&mut tx);
    let article = articles.get_by_id(id).await?.ok_or_else(|| article_not_found(id))?;

    check(&Actor::from(current_user), &ArticleView::from(&article), user_id)?;

    apply(&mut articles, id, user_id).await.map_err(|e| match e {
        crate::db::errors::DbError::NotFound => Error::NotFound {
            resource: "User".to_string(),
            id: user_id.to_string(),
        },
        e => Error::Database(e),
    })?;

    let updated = articles.get_by_id(id).await?.ok_or_else(|| article_not_found(id))?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(ArticleResponse::from(updated)))
}

#[cfg(test)]
mod tests {
    use crate::{api::models::users::Role, test_utils::*};
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_only_writers_create_articles(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let writer = create_test_user(&pool, vec![Role::Writer]).await;
        let reader = create_test_user(&pool, vec![Role::Reader]).await;

        let response = server
            .post("/api/v1/articles")
            .add_header("authorization", bearer_for(&writer))
            .json(&json!({"name": "Draft", "content": "text"}))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["state"], "draft");
        // The creator starts out as the only author
        assert_eq!(body["authors"], json!([writer.id]));

        server
            .post("/api/v1/articles")
            .add_header("authorization", bearer_for(&reader))
            .json(&json!({"name": "Draft", "content": "text"}))
            .await
            .assert_status(axum::http::StatusCode::FORBIDDEN);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_publish_approve_workflow(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let writer = create_test_user(&pool, vec![Role::Writer]).await;
        let moderator = create_test_user(&pool, vec![Role::Moderator]).await;

        let article = create_test_article(&server, &writer).await;
        let id = article["id"].as_str().unwrap();

        // Only the creator publishes
        server
            .post(&format!("/api/v1/articles/{id}/publish"))
            .add_header("authorization", bearer_for(&moderator))
            .await
            .assert_status(axum::http::StatusCode::FORBIDDEN);

        let response = server
            .post(&format!("/api/v1/articles/{id}/publish"))
            .add_header("authorization", bearer_for(&writer))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<serde_json::Value>()["state"], "published");

        // Publishing again conflicts
        server
            .post(&format!("/api/v1/articles/{id}/publish"))
            .add_header("authorization", bearer_for(&writer))
            .await
            .assert_status(axum::http::StatusCode::CONFLICT);

        // The creator cannot approve their own article
        server
            .post(&format!("/api/v1/articles/{id}/approve"))
            .add_header("authorization", bearer_for(&writer))
            .await
            .assert_status(axum::http::StatusCode::FORBIDDEN);

        let response = server
            .post(&format!("/api/v1/articles/{id}/approve"))
            .add_header("authorization", bearer_for(&moderator))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<serde_json::Value>()["state"], "approved");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_reject_attaches_commentary(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let writer = create_test_user(&pool, vec![Role::Writer]).await;
        let moderator = create_test_user(&pool, vec![Role::Moderator]).await;

        let article = create_test_article(&server, &writer).await;
        let id = article["id"].as_str().unwrap();

        server
            .post(&format!("/api/v1/articles/{id}/publish"))
            .add_header("authorization", bearer_for(&writer))
            .await
            .assert_status_ok();

        let response = server
            .post(&format!("/api/v1/articles/{id}/reject"))
            .add_header("authorization", bearer_for(&moderator))
            .json(&json!({"content": "needs sources"}))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<serde_json::Value>()["state"], "rejected");

        let commentary = sqlx::query_as::<_, (String, String)>(
            "SELECT content, state::text FROM commentaries WHERE article_id = $1",
        )
        .bind(uuid::Uuid::parse_str(id).unwrap())
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(commentary.0, "needs sources");
        assert_eq!(commentary.1, "reject_commentary");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unpublish_returns_to_draft(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let writer = create_test_user(&pool, vec![Role::Writer]).await;

        let article = create_test_article(&server, &writer).await;
        let id = article["id"].as_str().unwrap();

        // Unpublishing a draft conflicts
        server
            .post(&format!("/api/v1/articles/{id}/unpublish"))
            .add_header("authorization", bearer_for(&writer))
            .await
            .assert_status(axum::http::StatusCode::CONFLICT);

        server
            .post(&format!("/api/v1/articles/{id}/publish"))
            .add_header("authorization", bearer_for(&writer))
            .await
            .assert_status_ok();

        let response = server
            .post(&format!("/api/v1/articles/{id}/unpublish"))
            .add_header("authorization", bearer_for(&writer))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<serde_json::Value>()["state"], "draft");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_edits_are_draft_only(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let writer = create_test_user(&pool, vec![Role::Writer]).await;
        let editor = create_test_user(&pool, vec![Role::Reader]).await;

        let article = create_test_article(&server, &writer).await;
        let id = article["id"].as_str().unwrap();

        // An unrelated user cannot edit
        server
            .patch(&format!("/api/v1/articles/{id}"))
            .add_header("authorization", bearer_for(&editor))
            .json(&json!({"content": "hijacked"}))
            .await
            .assert_status(axum::http::StatusCode::FORBIDDEN);

        // Once added as an editor they can
        server
            .post(&format!("/api/v1/articles/{id}/editors/{}", editor.id))
            .add_header("authorization", bearer_for(&writer))
            .await
            .assert_status_ok();

        let response = server
            .patch(&format!("/api/v1/articles/{id}"))
            .add_header("authorization", bearer_for(&editor))
            .json(&json!({"content": "polished"}))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<serde_json::Value>()["content"], "polished");

        // After publishing, even the creator cannot edit
        server
            .post(&format!("/api/v1/articles/{id}/publish"))
            .add_header("authorization", bearer_for(&writer))
            .await
            .assert_status_ok();
        server
            .patch(&format!("/api/v1/articles/{id}"))
            .add_header("authorization", bearer_for(&writer))
            .json(&json!({"content": "late change"}))
            .await
            .assert_status(axum::http::StatusCode::CONFLICT);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_membership_rules(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let writer = create_test_user(&pool, vec![Role::Writer]).await;
        let coauthor = create_test_user(&pool, vec![Role::Writer]).await;

        let article = create_test_article(&server, &writer).await;
        let id = article["id"].as_str().unwrap();

        let response = server
            .post(&format!("/api/v1/articles/{id}/authors/{}", coauthor.id))
            .add_header("authorization", bearer_for(&writer))
            .await;
        response.assert_status_ok();

        // Adding the same author twice conflicts
        server
            .post(&format!("/api/v1/articles/{id}/authors/{}", coauthor.id))
            .add_header("authorization", bearer_for(&writer))
            .await
            .assert_status(axum::http::StatusCode::CONFLICT);

        // The creator can never be removed from the authors
        server
            .delete(&format!("/api/v1/articles/{id}/authors/{}", writer.id))
            .add_header("authorization", bearer_for(&writer))
            .await
            .assert_status(axum::http::StatusCode::CONFLICT);

        // Only the creator manages membership, even for other authors
        server
            .post(&format!("/api/v1/articles/{id}/editors/{}", coauthor.id))
            .add_header("authorization", bearer_for(&coauthor))
            .await
            .assert_status(axum::http::StatusCode::FORBIDDEN);

        server
            .delete(&format!("/api/v1/articles/{id}/authors/{}", coauthor.id))
            .add_header("authorization", bearer_for(&writer))
            .await
            .assert_status_ok();

        // Membership freezes once the article leaves draft
        server
            .post(&format!("/api/v1/articles/{id}/publish"))
            .add_header("authorization", bearer_for(&writer))
            .await
            .assert_status_ok();
        server
            .post(&format!("/api/v1/articles/{id}/authors/{}", coauthor.id))
            .add_header("authorization", bearer_for(&writer))
            .await
            .assert_status(axum::http::StatusCode::CONFLICT);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_read_access_matrix(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let writer = create_test_user(&pool, vec![Role::Writer]).await;
        let moderator = create_test_user(&pool, vec![Role::Moderator]).await;
        let reader = create_test_user(&pool, vec![Role::Reader]).await;
        let admin = create_test_user(&pool, vec![Role::Admin]).await;

        let article = create_test_article(&server, &writer).await;
        let id = article["id"].as_str().unwrap();
        let url = format!("/api/v1/articles/{id}");

        // Draft: creator and admin only (no authors/editors beyond the creator here)
        server.get(&url).add_header("authorization", bearer_for(&writer)).await.assert_status_ok();
        server.get(&url).add_header("authorization", bearer_for(&admin)).await.assert_status_ok();
        server
            .get(&url)
            .add_header("authorization", bearer_for(&moderator))
            .await
            .assert_status(axum::http::StatusCode::FORBIDDEN);
        server
            .get(&url)
            .add_header("authorization", bearer_for(&reader))
            .await
            .assert_status(axum::http::StatusCode::FORBIDDEN);

        // Published: moderators gain access, readers still locked out
        server
            .post(&format!("/api/v1/articles/{id}/publish"))
            .add_header("authorization", bearer_for(&writer))
            .await
            .assert_status_ok();
        server.get(&url).add_header("authorization", bearer_for(&moderator)).await.assert_status_ok();
        server
            .get(&url)
            .add_header("authorization", bearer_for(&reader))
            .await
            .assert_status(axum::http::StatusCode::FORBIDDEN);

        // Approved: readers gain access, moderators lose it
        server
            .post(&format!("/api/v1/articles/{id}/approve"))
            .add_header("authorization", bearer_for(&moderator))
            .await
            .assert_status_ok();
        server.get(&url).add_header("authorization", bearer_for(&reader)).await.assert_status_ok();
        server
            .get(&url)
            .add_header("authorization", bearer_for(&moderator))
            .await
            .assert_status(axum::http::StatusCode::FORBIDDEN);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_published_listing_is_asymmetric(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let writer_a = create_test_user(&pool, vec![Role::Writer]).await;
        let writer_b = create_test_user(&pool, vec![Role::Writer]).await;
        let moderator = create_test_user(&pool, vec![Role::Moderator]).await;

        for writer in [&writer_a, &writer_b] {
            let article = create_test_article(&server, writer).await;
            let id = article["id"].as_str().unwrap();
            server
                .post(&format!("/api/v1/articles/{id}/publish"))
                .add_header("authorization", bearer_for(writer))
                .await
                .assert_status_ok();
        }

        let all: Vec<serde_json::Value> = server
            .get("/api/v1/articles?filter=published")
            .add_header("authorization", bearer_for(&moderator))
            .await
            .json();
        assert_eq!(all.len(), 2);

        let own: Vec<serde_json::Value> = server
            .get("/api/v1/articles?filter=published")
            .add_header("authorization", bearer_for(&writer_a))
            .await
            .json();
        assert_eq!(own.len(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_missing_article_is_404(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let writer = create_test_user(&pool, vec![Role::Writer]).await;

        server
            .get(&format!("/api/v1/articles/{}", uuid::Uuid::new_v4()))
            .add_header("authorization", bearer_for(&writer))
            .await
            .assert_status(axum::http::StatusCode::NOT_FOUND);
    }
}
