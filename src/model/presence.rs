//! Presence snapshots as reported by the presence manager collaborator.

use serde::{Deserialize, Serialize};

use crate::model::id::RoleId;
use crate::model::user::OnlineStatus;

/// An opaque activity payload (custom status, "playing", rich presence, ...).
/// The engine never inspects these fields; it only carries them through to
/// the client verbatim, so they are kept as untyped JSON.
pub type Activity = serde_json::Value;

/// A member's current presence.
///
/// `roles` mirrors the member's role list at the time of the last presence
/// event. It is consulted by group assignment instead of the member
/// snapshot's own `roles` because a `PRESENCE_UPDATE` may carry a role change
/// before the corresponding member-update event has been applied.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Presence {
    pub status: OnlineStatus,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub roles: Vec<RoleId>,
}

/// A sparse update to a [`Presence`], as delivered by a `PRESENCE_UPDATE`
/// event. Any field left `None` means "unchanged"; `nick` is carried
/// separately as a tri-state flag rather than folded into the presence
/// itself, since its mere presence (even as `None`, meaning "nickname
/// cleared") changes how [`MemberList::pres_update`](crate::list::MemberList::pres_update)
/// classifies the update.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PartialPresence {
    pub status: Option<OnlineStatus>,
    #[serde(default)]
    pub activities: Option<Vec<Activity>>,
    pub roles: Option<Vec<RoleId>>,
    /// `Some(_)` signals a nickname change; absence (vs. `Some(None)`) is the
    /// "has_nick" flag from the distilled spec.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nick: Option<Option<String>>,
}

impl PartialPresence {
    #[must_use]
    pub fn has_nick(&self) -> bool {
        self.nick.is_some()
    }

    /// Applies this partial update onto a stored presence, returning the
    /// merged presence. `nick` is not part of [`Presence`] and is dropped
    /// here; callers apply it to the member snapshot separately.
    #[must_use]
    pub fn merge_onto(&self, base: &Presence) -> Presence {
        Presence {
            status: self.status.unwrap_or(base.status),
            activities: self.activities.clone().unwrap_or_else(|| base.activities.clone()),
            roles: self.roles.clone().unwrap_or_else(|| base.roles.clone()),
        }
    }
}
