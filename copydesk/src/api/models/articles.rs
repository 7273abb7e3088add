//! API request/response models for articles.

use crate::db::models::articles::ArticleDBResponse;
use crate::types::{ArticleId, CommentaryId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Lifecycle state of an article
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "article_state", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ArticleState {
    Draft,
    Published,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ArticleCreate {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ArticleUpdate {
    pub name: Option<String>,
    pub content: Option<String>,
}

/// Body for rejecting a published article; the content becomes the
/// rejection commentary attached to the article.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ArticleReject {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ArticleResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ArticleId,
    pub name: String,
    pub content: String,
    pub state: ArticleState,
    #[schema(value_type = String, format = "uuid")]
    pub creator_id: UserId,
    #[schema(value_type = Vec<String>, format = "uuid")]
    pub authors: Vec<UserId>,
    #[schema(value_type = Vec<String>, format = "uuid")]
    pub editors: Vec<UserId>,
    /// Commentaries in the approved state only
    #[schema(value_type = Vec<String>, format = "uuid")]
    pub commentaries: Vec<CommentaryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ArticleDBResponse> for ArticleResponse {
    fn from(db: ArticleDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            content: db.content,
            state: db.state,
            creator_id: db.creator_id,
            authors: db.authors,
            editors: db.editors,
            commentaries: db.commentaries,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Which id listing to return from `GET /articles`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ArticleListFilter {
    /// All approved articles
    Approved,
    /// Published articles: moderators and admins see all of them, everyone
    /// else sees only the published articles they author
    Published,
    /// Articles created by the caller
    Created,
    /// Articles the caller authors
    Authored,
    /// Articles the caller edits
    Edited,
}

#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
pub struct ListArticlesQuery {
    pub filter: ArticleListFilter,
}
