//! Users and their online status.

use serde::{Deserialize, Serialize};

use crate::model::id::UserId;

/// A user account, as cached from storage. Only the fields the member list
/// ever displays or sorts by are kept.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(rename = "username")]
    pub name: String,
}

/// A user's online status, as reported by the presence manager.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnlineStatus {
    Online,
    Idle,
    DoNotDisturb,
    Invisible,
    Offline,
}

impl OnlineStatus {
    #[must_use]
    pub const fn is_offline(self) -> bool {
        matches!(self, Self::Offline)
    }
}

impl Default for OnlineStatus {
    fn default() -> Self {
        Self::Offline
    }
}
