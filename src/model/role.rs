//! Guild roles, pared down to the fields the lazy member list consults.

use serde::{Deserialize, Serialize};

use crate::model::id::RoleId;
use crate::model::permissions::Permissions;

/// Information about a role within a guild.
///
/// Unlike a full Discord role, this carries no colour, managed-by-integration,
/// or mentionable flags: the engine only groups by hoist status, position and
/// the permission bits that decide channel visibility.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    /// Whether members of this role are displayed as their own group header.
    pub hoist: bool,
    pub permissions: Permissions,
    /// Higher positions sort earlier in the member list.
    pub position: i64,
}
