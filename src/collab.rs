//! Thin async interfaces over the engine's external collaborators: storage,
//! presence, and the session registry.
//!
//! The engine treats each of these as an opaque, possibly-failing service —
//! it never holds a concrete database handle or websocket. Production
//! wiring provides real implementations; tests use the in-memory fakes under
//! `tests/support`.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::prelude::*;

/// Read access to durable guild/channel/member/role state.
///
/// All methods are fallible: a failure here is propagated to the caller of
/// whichever engine entry point needed the data, per the specification's
/// error-handling design (storage/presence failures during initialization
/// surface to the caller and leave the list uninitialized).
#[async_trait]
pub trait Storage: Send + Sync {
    /// All member ids belonging to a guild.
    async fn get_member_ids(&self, guild: GuildId) -> Result<Vec<UserId>>;

    /// Every member's snapshot in a guild, keyed by user id.
    async fn get_member_data(&self, guild: GuildId) -> Result<HashMap<UserId, Member>>;

    /// A single member's snapshot.
    async fn get_member_data_one(&self, guild: GuildId, member: UserId) -> Result<Member>;

    /// The permission overwrites configured on a channel, keyed by role id.
    /// Member overwrites exist on the wire but are not consulted by group
    /// building, so only role overwrites are surfaced here.
    async fn chan_overwrites(
        &self,
        channel: ChannelId,
    ) -> Result<HashMap<RoleId, PermissionOverwrite>>;

    /// Resolves the guild a channel belongs to, if known.
    async fn guild_from_channel(&self, channel: ChannelId) -> Result<Option<GuildId>>;

    /// All roles of a guild.
    async fn fetch_roles(&self, guild: GuildId) -> Result<Vec<Role>>;
}

/// Read access to live presence data.
#[async_trait]
pub trait PresenceStore: Send + Sync {
    /// Presences for a set of members in a guild, keyed by user id. Members
    /// with no known presence are omitted, not defaulted to offline: the
    /// engine treats a missing presence the same as a missing member during
    /// initialization (see `MemberList::init`).
    async fn guild_presences(
        &self,
        member_ids: &[UserId],
        guild: GuildId,
    ) -> Result<HashMap<UserId, Presence>>;
}

/// A handle to a single subscribed session, as vended by the session
/// registry. `dispatch` delivers one `GUILD_MEMBER_LIST_UPDATE` payload and
/// never fails from the engine's point of view: delivery failures are the
/// adapter's concern to log and swallow.
#[async_trait]
pub trait SessionHandle: Send + Sync {
    async fn dispatch(&self, event: &str, payload: serde_json::Value);
}

/// Looks up live session handles by id.
#[async_trait]
pub trait SessionRegistry: Send + Sync {
    /// Returns `None` if the session has disconnected; callers must treat
    /// this as a silent no-op, never as an error.
    async fn fetch_raw(&self, session_id: &SessionId) -> Option<std::sync::Arc<dyn SessionHandle>>;
}
