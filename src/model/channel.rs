//! Channel-scoped permission overwrites.
//!
//! The engine only ever asks storage for the overwrites of a single channel
//! (`Storage::chan_overwrites`) and only ever mixes role overwrites into a
//! [`GroupInfo`](crate::list::group::GroupInfo)'s permissions; member
//! overwrites are modeled here for completeness with the wire format but are
//! not consulted by the group-building path, matching the distilled spec.

use serde::{Deserialize, Serialize};

use crate::model::id::{RoleId, UserId};
use crate::model::permissions::Permissions;

/// Which kind of entity a [`PermissionOverwrite`] applies to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionOverwriteType {
    Role(RoleId),
    Member(UserId),
}

/// A channel-specific permission overwrite for a member or role.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionOverwrite {
    pub allow: Permissions,
    pub deny: Permissions,
    pub kind: PermissionOverwriteType,
}

impl PermissionOverwrite {
    #[must_use]
    pub fn role_id(&self) -> Option<RoleId> {
        match self.kind {
            PermissionOverwriteType::Role(id) => Some(id),
            PermissionOverwriteType::Member(_) => None,
        }
    }
}
