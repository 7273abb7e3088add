//! API request/response models for users.

use crate::db::models::users::UserDBResponse;
use crate::types::{ArticleId, CommentaryId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Workflow role held by a user
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Moderator,
    Writer,
    Reader,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserUpdate {
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The caller's own profile with derived article/commentary relationships
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub roles: Vec<Role>,
    #[schema(value_type = Vec<String>, format = "uuid")]
    pub created_articles: Vec<ArticleId>,
    #[schema(value_type = Vec<String>, format = "uuid")]
    pub authored_articles: Vec<ArticleId>,
    #[schema(value_type = Vec<String>, format = "uuid")]
    pub edited_articles: Vec<ArticleId>,
    #[schema(value_type = Vec<String>, format = "uuid")]
    pub commentaries: Vec<CommentaryId>,
}

/// Authenticated caller, resolved from the bearer token on every request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub roles: Vec<Role>,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            email: db.email,
            is_active: db.is_active,
            roles: db.roles,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<UserDBResponse> for CurrentUser {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            email: db.email,
            is_active: db.is_active,
            roles: db.roles,
        }
    }
}
