//! Commentary workflow rules: creation on approved articles, moderation,
//! and the read-visibility matrix.

use super::{conflict, forbidden, Actor, ArticleView, CommentaryView, Decision};
use crate::api::models::articles::ArticleState;
use crate::api::models::commentaries::CommentaryState;
use crate::api::models::users::Role;

/// Commentaries are created by readers and admins, on approved articles only
pub fn create(actor: &Actor, article: &ArticleView) -> Decision {
    if !actor.has_any_role(&[Role::Reader, Role::Admin]) {
        return forbidden("only readers and admins can comment on articles");
    }
    if article.state != ArticleState::Approved {
        return conflict("commentaries can only be added to approved articles");
    }
    Ok(())
}

/// Moderators and admins move a published commentary to approved or rejected
pub fn moderate(actor: &Actor, commentary: &CommentaryView) -> Decision {
    if !actor.has_any_role(&[Role::Moderator, Role::Admin]) {
        return forbidden("only moderators and admins can moderate commentaries");
    }
    if commentary.state != CommentaryState::Published {
        return conflict("only published commentaries can be moderated");
    }
    Ok(())
}

/// Read access matrix: the creator and admins always; readers see approved
/// commentaries; moderators see everything except approved ones.
pub fn read(actor: &Actor, commentary: &CommentaryView) -> Decision {
    if commentary.is_creator(actor) || actor.has_role(Role::Admin) {
        return Ok(());
    }
    let allowed = if commentary.state == CommentaryState::Approved {
        actor.has_role(Role::Reader)
    } else {
        actor.has_role(Role::Moderator)
    };
    if allowed {
        Ok(())
    } else {
        forbidden("no read access to this commentary")
    }
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

    fn article(state: ArticleState) -> ArticleView {
        ArticleView {
            id: Uuid::new_v4(),
            state,
            creator: Uuid::new_v4(),
            authors: HashSet::new(),
            editors: HashSet::new(),
        }
    }

    fn commentary_of(creator: &Actor, state: CommentaryState) -> CommentaryView {
        CommentaryView {
            id: Uuid::new_v4(),
            state,
            creator: creator.id,
        }
    }

    fn is_forbidden(decision: Decision) -> bool {
        matches!(decision, Err(PolicyViolation::Forbidden(_)))
    }

    fn is_conflict(decision: Decision) -> bool {
        matches!(decision, Err(PolicyViolation::Conflict(_)))
    }

    #[test]
    fn create_requires_reader_or_admin_on_approved_article() {
        let reader = actor(&[Role::Reader]);
        let admin = actor(&[Role::Admin]);
        let writer = actor(&[Role::Writer]);

        let approved = article(ArticleState::Approved);
        assert!(create(&reader, &approved).is_ok());
        assert!(create(&admin, &approved).is_ok());
        assert!(is_forbidden(create(&writer, &approved)));

        for state in [ArticleState::Draft, ArticleState::Published, ArticleState::Rejected] {
            assert!(is_conflict(create(&reader, &article(state))), "state {state:?}");
        }

        // Role failure dominates state failure
        assert!(is_forbidden(create(&writer, &article(ArticleState::Draft))));
    }

    #[test]
    fn moderation_only_from_published() {
        let reader = actor(&[Role::Reader]);
        let moderator = actor(&[Role::Moderator]);

        let published = commentary_of(&reader, CommentaryState::Published);
        assert!(moderate(&moderator, &published).is_ok());
        assert!(is_forbidden(moderate(&reader, &published)));

        for state in [
            CommentaryState::Approved,
            CommentaryState::Rejected,
            CommentaryState::RejectCommentary,
        ] {
            let commentary = commentary_of(&reader, state);
            assert!(is_conflict(moderate(&moderator, &commentary)), "state {state:?}");
        }
    }

    #[test]
    fn read_matrix() {
        let creator = actor(&[Role::Reader]);
        let reader = actor(&[Role::Reader]);
        let moderator = actor(&[Role::Moderator]);
        let admin = actor(&[Role::Admin]);
        let writer = actor(&[Role::Writer]);

        // Approved: creator, admin, readers; moderators shut out
        let approved = commentary_of(&creator, CommentaryState::Approved);
        assert!(read(&creator, &approved).is_ok());
        assert!(read(&admin, &approved).is_ok());
        assert!(read(&reader, &approved).is_ok());
        assert!(is_forbidden(read(&moderator, &approved)));
        assert!(is_forbidden(read(&writer, &approved)));

        // Everything else: creator, admin, moderators; readers shut out
        for state in [
            CommentaryState::Published,
            CommentaryState::Rejected,
            CommentaryState::RejectCommentary,
        ] {
            let commentary = commentary_of(&creator, state);
            assert!(read(&creator, &commentary).is_ok(), "state {state:?}");
            assert!(read(&admin, &commentary).is_ok(), "state {state:?}");
            assert!(read(&moderator, &commentary).is_ok(), "state {state:?}");
            assert!(is_forbidden(read(&reader, &commentary)), "state {state:?}");
            assert!(is_forbidden(read(&writer, &commentary)), "state {state:?}");
        }
    }

    #[test]
    fn moderator_who_is_also_reader_sees_everything() {
        let creator = actor(&[Role::Reader]);
        let both = actor(&[Role::Reader, Role::Moderator]);

        for state in [
            CommentaryState::Published,
            CommentaryState::Approved,
            CommentaryState::Rejected,
            CommentaryState::RejectCommentary,
        ] {
            assert!(read(&both, &commentary_of(&creator, state)).is_ok(), "state {state:?}");
        }
    }
}
