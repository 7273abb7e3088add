//! Access and workflow policy for articles and commentaries.
//!
//! Every gated operation is a pure function over immutable snapshots of the
//! caller and the entity. Handlers fetch current state, build the snapshots,
//! and consult this module before touching the database; existence checks
//! (404s) happen upstream, so these functions are total over well-formed
//! inputs.

pub mod articles;
pub mod commentaries;
pub mod users;

use crate::api::models::articles::ArticleState;
use crate::api::models::commentaries::CommentaryState;
use crate::api::models::users::{CurrentUser, Role};
use crate::db::models::articles::ArticleDBResponse;
use crate::db::models::commentaries::CommentaryDBResponse;
use crate::types::{ArticleId, CommentaryId, UserId};
use std::collections::HashSet;
use thiserror::Error;

/// Why an operation was denied. `Forbidden` means the caller's role or
/// relationship does not allow it (403); `Conflict` means the caller could
/// perform it, but the entity is not in a state that admits it (409).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyViolation {
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
}

pub type Decision = Result<(), PolicyViolation>;

/// Snapshot of the caller for policy evaluation
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: UserId,
    pub roles: HashSet<Role>,
}

impl Actor {
    pub fn new(id: UserId, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            id,
            roles: roles.into_iter().collect(),
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|role| self.roles.contains(role))
    }
}

impl From<&CurrentUser> for Actor {
    fn from(user: &CurrentUser) -> Self {
        Actor::new(user.id, user.roles.iter().copied())
    }
}

/// Snapshot of an article for policy evaluation
#[derive(Debug, Clone)]
pub struct ArticleView {
    pub id: ArticleId,
    pub state: ArticleState,
    pub creator: UserId,
    pub authors: HashSet<UserId>,
    pub editors: HashSet<UserId>,
}

impl ArticleView {
    pub fn is_creator(&self, actor: &Actor) -> bool {
        self.creator == actor.id
    }

    pub fn is_author(&self, actor: &Actor) -> bool {
        self.authors.contains(&actor.id)
    }

    pub fn is_editor(&self, actor: &Actor) -> bool {
        self.editors.contains(&actor.id)
    }
}

impl From<&ArticleDBResponse> for ArticleView {
    fn from(article: &ArticleDBResponse) -> Self {
        Self {
            id: article.id,
            state: article.state,
            creator: article.creator_id,
            authors: article.authors.iter().copied().collect(),
            editors: article.editors.iter().copied().collect(),
        }
    }
}

/// Snapshot of a commentary for policy evaluation
#[derive(Debug, Clone)]
pub struct CommentaryView {
    pub id: CommentaryId,
    pub state: CommentaryState,
    pub creator: UserId,
}

impl CommentaryView {
    pub fn is_creator(&self, actor: &Actor) -> bool {
        self.creator == actor.id
    }
}

impl From<&CommentaryDBResponse> for CommentaryView {
    fn from(commentary: &CommentaryDBResponse) -> Self {
        Self {
            id: commentary.id,
            state: commentary.state,
            creator: commentary.creator_id,
        }
    }
}

fn forbidden(reason: impl Into<String>) -> Decision {
    Err(PolicyViolation::Forbidden(reason.into()))
}

fn conflict(message: impl Into<String>) -> Decision {
    Err(PolicyViolation::Conflict(message.into()))
}
