//! Data types shared by the lazy member list engine.
//!
//! These are deliberately thin compared to a full Discord model: every field
//! kept here is one the engine actually reads. Storage, presence and session
//! registry collaborators are free to carry richer types on their own side
//! of the interface; only what crosses into [`crate::list`] is modeled.

pub mod channel;
pub mod id;
pub mod member;
pub mod permissions;
pub mod presence;
pub mod role;
pub mod user;

pub mod prelude {
    pub use super::channel::{PermissionOverwrite, PermissionOverwriteType};
    pub use super::id::{ChannelId, GuildId, RoleId, SessionId, UserId};
    pub use super::member::Member;
    pub use super::permissions::Permissions;
    pub use super::presence::{Activity, PartialPresence, Presence};
    pub use super::role::Role;
    pub use super::user::{OnlineStatus, User};
}
