//! Database layer models for articles.

use crate::api::models::articles::ArticleState;
use crate::types::{ArticleId, CommentaryId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleCreateDBRequest {
    pub name: String,
    pub content: String,
    pub creator_id: UserId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticleUpdateDBRequest {
    pub name: Option<String>,
    pub content: Option<String>,
}

/// Article row assembled with its author/editor sets and the ids of its
/// approved commentaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleDBResponse {
    pub id: ArticleId,
    pub name: String,
    pub content: String,
    pub state: ArticleState,
    pub creator_id: UserId,
    pub authors: Vec<UserId>,
    pub editors: Vec<UserId>,
    pub commentaries: Vec<CommentaryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
