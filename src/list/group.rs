//! Group identity and construction.

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

use crate::constants::MAX_ROLES;
use crate::list::perm::mix_with_overwrite;
use crate::model::prelude::*;

/// Identifies a group within a channel's member list: either a hoisted
/// role, or one of the two synthetic tags every list carries.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Gid {
    Role(RoleId),
    Online,
    Offline,
}

impl Display for Gid {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Role(id) => Display::fmt(id, f),
            Self::Online => f.write_str("online"),
            Self::Offline => f.write_str("offline"),
        }
    }
}

/// A single group header's metadata: identity, display name, sort position
/// and the channel-effective permissions that earned it a place in the list.
#[derive(Clone, Debug)]
pub struct GroupInfo {
    pub gid: Gid,
    pub name: String,
    pub position: i64,
    pub permissions: Permissions,
}

impl GroupInfo {
    fn synthetic(gid: Gid, name: &str, position: i64) -> Self {
        Self { gid, name: name.to_owned(), position, permissions: Permissions::empty() }
    }
}

/// Builds the ordered group list for a channel: every hoisted role that can
/// read the channel, sorted by position descending, followed by the
/// synthetic `online` and `offline` groups.
///
/// Returns the groups plus the role-overwrite map the caller should retain
/// (`MemberList::overwrites`), since later handlers (`new_role`,
/// `role_update`, `role_pos_update`) need to re-mix against it without a
/// fresh storage round-trip.
#[must_use]
pub fn build_groups(
    roles: &[Role],
    overwrites: &HashMap<RoleId, PermissionOverwrite>,
) -> Vec<GroupInfo> {
    let mut groups: Vec<GroupInfo> = roles
        .iter()
        .filter(|r| r.hoist)
        .filter_map(|r| {
            let mixed = mix_with_overwrite(r.permissions, overwrites, r.id);
            mixed.read_messages().then(|| GroupInfo {
                gid: Gid::Role(r.id),
                name: r.name.clone(),
                position: r.position,
                permissions: mixed,
            })
        })
        .collect();

    groups.sort_by(|a, b| b.position.cmp(&a.position));

    groups.push(GroupInfo::synthetic(Gid::Online, "online", MAX_ROLES + 1));
    groups.push(GroupInfo::synthetic(Gid::Offline, "offline", MAX_ROLES + 2));
    groups
}

/// Decides which group a member belongs in, given their effective channel
/// permissions, their roles (as reported alongside their current presence)
/// and their online status.
///
/// Returns `None` if the member cannot read the channel at all; such
/// members are dropped from the list entirely.
#[must_use]
pub fn assign_group(
    can_read: bool,
    groups: &[GroupInfo],
    member_roles: &[RoleId],
    status: OnlineStatus,
) -> Option<Gid> {
    if !can_read {
        return None;
    }
    if status.is_offline() {
        return Some(Gid::Offline);
    }
    for group in groups {
        if let Gid::Role(role_id) = group.gid {
            if member_roles.contains(&role_id) {
                return Some(group.gid);
            }
        }
    }
    Some(Gid::Online)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(id: u64, hoist: bool, position: i64) -> Role {
        Role { id: RoleId::new(id), name: format!("r{id}"), hoist, permissions: Permissions::READ_MESSAGES, position }
    }

    #[test]
    fn non_hoisted_roles_are_not_groups() {
        let roles = vec![role(1, false, 5)];
        let groups = build_groups(&roles, &HashMap::new());
        assert_eq!(groups.len(), 2);
        assert!(matches!(groups[0].gid, Gid::Online));
    }

    #[test]
    fn hoisted_roles_without_read_messages_are_dropped() {
        let mut r = role(1, true, 5);
        r.permissions = Permissions::empty();
        let groups = build_groups(&[r], &HashMap::new());
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn groups_sort_by_position_descending_with_synthetics_last() {
        let roles = vec![role(1, true, 1), role(2, true, 10)];
        let groups = build_groups(&roles, &HashMap::new());
        let gids: Vec<_> = groups.iter().map(|g| g.gid).collect();
        assert_eq!(
            gids,
            vec![Gid::Role(RoleId::new(2)), Gid::Role(RoleId::new(1)), Gid::Online, Gid::Offline]
        );
    }

    #[test]
    fn offline_status_wins_regardless_of_roles() {
        let roles = vec![role(1, true, 5)];
        let groups = build_groups(&roles, &HashMap::new());
        let gid = assign_group(true, &groups, &[RoleId::new(1)], OnlineStatus::Offline);
        assert_eq!(gid, Some(Gid::Offline));
    }

    #[test]
    fn member_without_matching_hoisted_role_falls_back_to_online() {
        let roles = vec![role(1, true, 5)];
        let groups = build_groups(&roles, &HashMap::new());
        let gid = assign_group(true, &groups, &[], OnlineStatus::Online);
        assert_eq!(gid, Some(Gid::Online));
    }

    #[test]
    fn member_who_cannot_read_is_dropped() {
        let groups = build_groups(&[], &HashMap::new());
        assert_eq!(assign_group(false, &groups, &[], OnlineStatus::Online), None);
    }
}
