//! API request/response models for commentaries.

use crate::db::models::commentaries::CommentaryDBResponse;
use crate::types::{ArticleId, CommentaryId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle state of a commentary.
///
/// `RejectCommentary` marks the commentary a moderator attaches when
/// rejecting an article; it never moves to another state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "commentary_state", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CommentaryState {
    Published,
    Approved,
    Rejected,
    RejectCommentary,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommentaryCreate {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommentaryResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: CommentaryId,
    pub content: String,
    pub state: CommentaryState,
    #[schema(value_type = String, format = "uuid")]
    pub creator_id: UserId,
    #[schema(value_type = String, format = "uuid")]
    pub article_id: ArticleId,
    pub created_at: DateTime<Utc>,
}

impl From<CommentaryDBResponse> for CommentaryResponse {
    fn from(db: CommentaryDBResponse) -> Self {
        Self {
            id: db.id,
            content: db.content,
            state: db.state,
            creator_id: db.creator_id,
            article_id: db.article_id,
            created_at: db.created_at,
        }
    }
}
