//! User administration rules: role grants and revocations, user listing,
//! and activation changes are all admin operations.

use super::{conflict, forbidden, Actor, Decision};
use crate::api::models::users::Role;

pub fn manage_users(actor: &Actor) -> Decision {
    if !actor.has_role(Role::Admin) {
        return forbidden("only admins can manage users");
    }
    Ok(())
}

/// Granting a role the target already holds is a conflict
pub fn grant_role(actor: &Actor, target_roles: &[Role], role: Role) -> Decision {
    manage_users(actor)?;
    if target_roles.contains(&role) {
        return conflict("user already has this role");
    }
    Ok(())
}

/// Revoking a role the target does not hold is a conflict
pub fn revoke_role(actor: &Actor, target_roles: &[Role], role: Role) -> Decision {
    manage_users(actor)?;
    if !target_roles.contains(&role) {
        return conflict("user does not have this role");
    }
    Ok(())
}
