//! Pure permission-mixing helpers.
//!
//! Mirrors the teacher's `Guild::_user_permissions_in`/`role_permissions_in`:
//! role permissions are OR'd together, then channel overwrites are applied in
//! a deny-then-allow pass. Here the inputs are already-fetched snapshots
//! (a role list, a member, a channel's overwrite map) rather than a live
//! cache lookup, since the engine receives these from the `Storage`
//! collaborator up front.

use std::collections::HashMap;

use crate::model::prelude::*;

/// The base permission bits of a single role, with no channel overwrite
/// applied. Returns an empty set if the role is not found.
#[must_use]
pub fn role_permissions(roles: &[Role], role_id: RoleId) -> Permissions {
    roles
        .iter()
        .find(|r| r.id == role_id)
        .map_or(Permissions::empty(), |r| r.permissions)
}

/// Mixes a base permission set with the channel overwrite registered for
/// `gid`, if any: `deny` bits are cleared first, then `allow` bits are set.
/// `ADMINISTRATOR` bypasses overwrites entirely, matching the teacher's
/// guild-permission resolution.
#[must_use]
pub fn mix_with_overwrite(
    base: Permissions,
    overwrites: &HashMap<RoleId, PermissionOverwrite>,
    gid: RoleId,
) -> Permissions {
    if base.administrator() {
        return Permissions::all();
    }
    match overwrites.get(&gid) {
        Some(overwrite) => (base & !overwrite.deny) | overwrite.allow,
        None => base,
    }
}

/// A member's effective permissions in a channel: the `@everyone` role's
/// bits, plus the union of their explicit roles' permissions, each mixed
/// with the channel's role overwrites, OR'd together.
#[must_use]
pub fn member_permissions(
    member: &Member,
    guild_id: GuildId,
    roles: &[Role],
    overwrites: &HashMap<RoleId, PermissionOverwrite>,
) -> Permissions {
    permissions_for_roles(&member.roles, guild_id, roles, overwrites)
}

/// As [`member_permissions`], but takes a bare role-id list rather than a
/// [`Member`]. Presence-driven handlers resolve effective permissions from
/// the role list a `PRESENCE_UPDATE` carries, which may be fresher than the
/// stored member snapshot's own `roles` field.
///
/// Mirrors the teacher's `Guild::_user_permissions_in`: permissions start
/// from the `@everyone` role (conventionally the role sharing the guild's
/// own id) before folding in the member's explicit roles, since a member's
/// role list never carries `@everyone` explicitly.
#[must_use]
pub fn permissions_for_roles(
    role_ids: &[RoleId],
    guild_id: GuildId,
    roles: &[Role],
    overwrites: &HashMap<RoleId, PermissionOverwrite>,
) -> Permissions {
    let everyone_id = RoleId::new(guild_id.get());
    if role_permissions(roles, everyone_id).administrator()
        || role_ids.iter().any(|id| role_permissions(roles, *id).administrator())
    {
        return Permissions::all();
    }

    let base = mix_with_overwrite(role_permissions(roles, everyone_id), overwrites, everyone_id);
    role_ids.iter().fold(base, |acc, role_id| {
        let base = role_permissions(roles, *role_id);
        acc | mix_with_overwrite(base, overwrites, *role_id)
    })
}
