//! A set of permissions that can be assigned to roles or mixed in via a
//! channel's [`PermissionOverwrite`]s.
//!
//! Only the permission bits the lazy member list engine actually reasons
//! about are kept (most importantly [`Permissions::READ_MESSAGES`], which
//! gates whether a role forms a group and whether a member can be listed at
//! all); the remaining bits are carried to keep the bitset's layout
//! compatible with a real permission integer received from storage.
//!
//! [`PermissionOverwrite`]: crate::model::channel::PermissionOverwrite

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    #[derive(Copy, Clone, Default, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Permissions: u64 {
        const CREATE_INVITE = 1 << 0;
        const KICK_MEMBERS = 1 << 1;
        const BAN_MEMBERS = 1 << 2;
        /// Allows all permissions, bypassing channel [permission overwrite]s.
        ///
        /// [permission overwrite]: crate::model::channel::PermissionOverwrite
        const ADMINISTRATOR = 1 << 3;
        const MANAGE_CHANNELS = 1 << 4;
        const MANAGE_GUILD = 1 << 5;
        const ADD_REACTIONS = 1 << 6;
        /// Allows reading messages in a guild channel. If a member does not
        /// have this permission in a channel, they are neither listed in, nor
        /// able to subscribe to, that channel's member list.
        const READ_MESSAGES = 1 << 10;
        const SEND_MESSAGES = 1 << 11;
        const MANAGE_MESSAGES = 1 << 13;
        const MANAGE_ROLES = 1 << 28;
    }
}

impl Permissions {
    #[must_use]
    pub const fn read_messages(self) -> bool {
        self.contains(Self::READ_MESSAGES)
    }

    #[must_use]
    pub const fn administrator(self) -> bool {
        self.contains(Self::ADMINISTRATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_permissions_cannot_read() {
        assert!(!Permissions::empty().read_messages());
    }

    #[test]
    fn administrator_is_a_distinct_bit_from_read_messages() {
        assert!(Permissions::ADMINISTRATOR.administrator());
        assert!(!Permissions::ADMINISTRATOR.read_messages());
    }
}
