//! Shared identifier types and small helpers.

use uuid::Uuid;

pub type UserId = Uuid;
pub type ArticleId = Uuid;
pub type CommentaryId = Uuid;

/// Abbreviate a UUID for log fields (first 8 hex chars).
pub fn abbrev_uuid(id: &Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}
