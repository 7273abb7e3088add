//! Database layer models for commentaries.

use crate::api::models::commentaries::CommentaryState;
use crate::types::{ArticleId, CommentaryId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentaryCreateDBRequest {
    pub content: String,
    pub state: CommentaryState,
    pub creator_id: UserId,
    pub article_id: ArticleId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentaryUpdateDBRequest {
    pub state: CommentaryState,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentaryDBResponse {
    pub id: CommentaryId,
    pub content: String,
    pub state: CommentaryState,
    pub creator_id: UserId,
    pub article_id: ArticleId,
    pub created_at: DateTime<Utc>,
}
