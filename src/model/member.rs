//! Guild member snapshots, as returned by the storage collaborator.

use serde::{Deserialize, Serialize};

use crate::model::id::RoleId;
use crate::model::user::User;

/// A guild member: a [`User`] plus per-guild state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub user: User,
    pub nick: Option<String>,
    pub roles: Vec<RoleId>,
}

impl Member {
    /// The name used to sort this member within a group: the nickname if
    /// set, otherwise the username.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.nick.as_deref().unwrap_or(&self.user.name)
    }
}
