//! Article workflow rules: who may create, read, edit, publish, moderate,
//! and manage the author/editor sets, and in which states.
//!
//! Actor checks come before state checks, so a caller who is both
//! unauthorized and out-of-state gets a Forbidden rather than a Conflict.

use super::{conflict, forbidden, Actor, ArticleView, Decision};
use crate::api::models::articles::ArticleState;
use crate::api::models::users::Role;
use crate::types::UserId;

/// Only writers and admins create articles
pub fn create(actor: &Actor) -> Decision {
    if !actor.has_any_role(&[Role::Writer, Role::Admin]) {
        return forbidden("only writers and admins can create articles");
    }
    Ok(())
}

/// Read access matrix: the creator and admins always; authors and editors
/// while drafting; moderators for published and rejected articles; readers
/// for approved articles.
pub fn read(actor: &Actor, article: &ArticleView) -> Decision {
    if article.is_creator(actor) || actor.has_role(Role::Admin) {
        return Ok(());
    }
    let allowed = match article.state {
        ArticleState::Draft => article.is_author(actor) || article.is_editor(actor),
        ArticleState::Published | ArticleState::Rejected => actor.has_role(Role::Moderator),
        ArticleState::Approved => actor.has_role(Role::Reader),
    };
    if allowed {
        Ok(())
    } else {
        forbidden("no read access to this article")
    }
}

/// Content edits: creator, authors, and editors, and only while drafting
pub fn edit(actor: &Actor, article: &ArticleView) -> Decision {
    if !(article.is_creator(actor) || article.is_author(actor) || article.is_editor(actor)) {
        return forbidden("only the creator, authors, and editors can edit an article");
    }
    if article.state != ArticleState::Draft {
        return conflict("only draft articles can be edited");
    }
    Ok(())
}

pub fn publish(actor: &Actor, article: &ArticleView) -> Decision {
    if !article.is_creator(actor) {
        return forbidden("only the creator can publish an article");
    }
    if article.state != ArticleState::Draft {
        return conflict("only draft articles can be published");
    }
    Ok(())
}

pub fn unpublish(actor: &Actor, article: &ArticleView) -> Decision {
    if !article.is_creator(actor) {
        return forbidden("only the creator can unpublish an article");
    }
    if article.state != ArticleState::Published {
        return conflict("only published articles can be unpublished");
    }
    Ok(())
}

pub fn approve(actor: &Actor, article: &ArticleView) -> Decision {
    moderate(actor, article)
}

pub fn reject(actor: &Actor, article: &ArticleView) -> Decision {
    moderate(actor, article)
}

fn moderate(actor: &Actor, article: &ArticleView) -> Decision {
    if !actor.has_any_role(&[Role::Moderator, Role::Admin]) {
        return forbidden("only moderators and admins can moderate articles");
    }
    if article.state != ArticleState::Published {
        return conflict("only published articles can be moderated");
    }
    Ok(())
}

/// Author/editor membership is mutable only by the creator and only while drafting
fn modify_members(actor: &Actor, article: &ArticleView) -> Decision {
    if !article.is_creator(actor) {
        return forbidden("only the creator can change the authors and editors of an article");
    }
    if article.state != ArticleState::Draft {
        return conflict("authors and editors can only be changed while the article is a draft");
    }
    Ok(())
}

pub fn add_author(actor: &Actor, article: &ArticleView, user: UserId) -> Decision {
    modify_members(actor, article)?;
    if article.authors.contains(&user) {
        return conflict("user is already an author of this article");
    }
    Ok(())
}

pub fn remove_author(actor: &Actor, article: &ArticleView, user: UserId) -> Decision {
    modify_members(actor, article)?;
    if user == article.creator {
        return conflict("the creator cannot be removed from the authors of an article");
    }
    if !article.authors.contains(&user) {
        return conflict("user is not an author of this article");
    }
    Ok(())
}

pub fn add_editor(actor: &Actor, article: &ArticleView, user: UserId) -> Decision {
    modify_members(actor, article)?;
    if article.editors.contains(&user) {
        return conflict("user is already an editor of this article");
    }
    Ok(())
}

pub fn remove_editor(actor: &Actor, article: &ArticleView, user: UserId) -> Decision {
    modify_members(actor, article)?;
    if !article.editors.contains(&user) {
        return conflict("user is not an editor of this article");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicyViolation;
    use std::collections::HashSet;
    use uuid::Uuid;

    fn actor(roles: &[Role]) -> Actor {
        Actor::new(Uuid::new_v4(), roles.iter().copied())
    }

    fn article_of(creator: &Actor, state: ArticleState) -> ArticleView {
        ArticleView {
            id: Uuid::new_v4(),
            state,
            creator: creator.id,
            authors: HashSet::from([creator.id]),
            editors: HashSet::new(),
        }
    }

    fn is_forbidden(decision: Decision) -> bool {
        matches!(decision, Err(PolicyViolation::Forbidden(_)))
    }

    fn is_conflict(decision: Decision) -> bool {
        matches!(decision, Err(PolicyViolation::Conflict(_)))
    }

    #[test]
    fn create_requires_writer_or_admin() {
        assert!(create(&actor(&[Role::Writer])).is_ok());
        assert!(create(&actor(&[Role::Admin])).is_ok());
        assert!(is_forbidden(create(&actor(&[Role::Reader]))));
        assert!(is_forbidden(create(&actor(&[Role::Moderator]))));
        assert!(is_forbidden(create(&actor(&[]))));
    }

    #[test]
    fn publish_is_creator_only_from_draft() {
        let writer = actor(&[Role::Writer]);
        let draft = article_of(&writer, ArticleState::Draft);

        assert!(publish(&writer, &draft).is_ok());

        // Another writer, even an author, cannot publish
        let other = actor(&[Role::Writer]);
        let mut shared = draft.clone();
        shared.authors.insert(other.id);
        assert!(is_forbidden(publish(&other, &shared)));

        // Wrong state is a conflict, not a forbidden
        let published = article_of(&writer, ArticleState::Published);
        assert!(is_conflict(publish(&writer, &published)));
    }

    #[test]
    fn unpublish_requires_published_state() {
        let writer = actor(&[Role::Writer]);
        let published = article_of(&writer, ArticleState::Published);
        assert!(unpublish(&writer, &published).is_ok());

        for state in [ArticleState::Draft, ArticleState::Approved, ArticleState::Rejected] {
            let article = article_of(&writer, state);
            assert!(is_conflict(unpublish(&writer, &article)), "state {state:?}");
        }

        let moderator = actor(&[Role::Moderator]);
        assert!(is_forbidden(unpublish(&moderator, &published)));
    }

    #[test]
    fn moderation_gated_on_role_then_state() {
        let writer = actor(&[Role::Writer]);
        let moderator = actor(&[Role::Moderator]);
        let admin = actor(&[Role::Admin]);

        let published = article_of(&writer, ArticleState::Published);
        assert!(approve(&moderator, &published).is_ok());
        assert!(reject(&admin, &published).is_ok());
        assert!(is_forbidden(approve(&writer, &published)));

        let draft = article_of(&writer, ArticleState::Draft);
        assert!(is_conflict(approve(&moderator, &draft)));
        assert!(is_conflict(reject(&moderator, &draft)));

        // An unauthorized caller on an out-of-state article gets Forbidden
        assert!(is_forbidden(approve(&writer, &draft)));
    }

    #[test]
    fn edit_allowed_for_creator_authors_editors_in_draft() {
        let writer = actor(&[Role::Writer]);
        let author = actor(&[Role::Writer]);
        let editor = actor(&[Role::Reader]);
        let stranger = actor(&[Role::Writer]);

        let mut draft = article_of(&writer, ArticleState::Draft);
        draft.authors.insert(author.id);
        draft.editors.insert(editor.id);

        assert!(edit(&writer, &draft).is_ok());
        assert!(edit(&author, &draft).is_ok());
        assert!(edit(&editor, &draft).is_ok());
        assert!(is_forbidden(edit(&stranger, &draft)));

        let mut published = draft.clone();
        published.state = ArticleState::Published;
        assert!(is_conflict(edit(&writer, &published)));
    }

    #[test]
    fn membership_changes_are_creator_only_in_draft() {
        let writer = actor(&[Role::Writer]);
        let other = actor(&[Role::Writer]);
        let target = Uuid::new_v4();
        let draft = article_of(&writer, ArticleState::Draft);

        assert!(add_author(&writer, &draft, target).is_ok());
        assert!(add_editor(&writer, &draft, target).is_ok());
        assert!(is_forbidden(add_author(&other, &draft, target)));

        let published = article_of(&writer, ArticleState::Published);
        assert!(is_conflict(add_author(&writer, &published, target)));
        assert!(is_conflict(remove_editor(&writer, &published, target)));
    }

    #[test]
    fn duplicate_and_missing_members_conflict() {
        let writer = actor(&[Role::Writer]);
        let target = Uuid::new_v4();
        let mut draft = article_of(&writer, ArticleState::Draft);
        draft.authors.insert(target);
        draft.editors.insert(target);

        assert!(is_conflict(add_author(&writer, &draft, target)));
        assert!(is_conflict(add_editor(&writer, &draft, target)));
        assert!(remove_author(&writer, &draft, target).is_ok());
        assert!(remove_editor(&writer, &draft, target).is_ok());

        let missing = Uuid::new_v4();
        assert!(is_conflict(remove_author(&writer, &draft, missing)));
        assert!(is_conflict(remove_editor(&writer, &draft, missing)));
    }

    #[test]
    fn creator_cannot_be_removed_from_authors() {
        let writer = actor(&[Role::Writer]);
        let draft = article_of(&writer, ArticleState::Draft);
        assert!(is_conflict(remove_author(&writer, &draft, writer.id)));
    }

    #[test]
    fn read_matrix() {
        let writer = actor(&[Role::Writer]);
        let author = actor(&[Role::Writer]);
        let editor = actor(&[Role::Reader]);
        let moderator = actor(&[Role::Moderator]);
        let reader = actor(&[Role::Reader]);
        let admin = actor(&[Role::Admin]);
        let stranger = actor(&[Role::Writer]);

        let mut base = article_of(&writer, ArticleState::Draft);
        base.authors.insert(author.id);
        base.editors.insert(editor.id);

        // Draft: creator, authors, editors, admin
        assert!(read(&writer, &base).is_ok());
        assert!(read(&author, &base).is_ok());
        assert!(read(&editor, &base).is_ok());
        assert!(read(&admin, &base).is_ok());
        assert!(is_forbidden(read(&moderator, &base)));
        assert!(is_forbidden(read(&reader, &base)));
        assert!(is_forbidden(read(&stranger, &base)));

        // Published and rejected: creator, admin, moderators
        for state in [ArticleState::Published, ArticleState::Rejected] {
            let mut article = base.clone();
            article.state = state;
            assert!(read(&writer, &article).is_ok(), "state {state:?}");
            assert!(read(&moderator, &article).is_ok(), "state {state:?}");
            assert!(read(&admin, &article).is_ok(), "state {state:?}");
            assert!(is_forbidden(read(&reader, &article)), "state {state:?}");
            assert!(is_forbidden(read(&author, &article)), "state {state:?}");
        }

        // Approved: creator, admin, readers
        let mut approved = base.clone();
        approved.state = ArticleState::Approved;
        assert!(read(&writer, &approved).is_ok());
        assert!(read(&reader, &approved).is_ok());
        // The editor actor also holds the reader role
        assert!(read(&editor, &approved).is_ok());
        assert!(is_forbidden(read(&moderator, &approved)));
        assert!(is_forbidden(read(&stranger, &approved)));
    }
}
