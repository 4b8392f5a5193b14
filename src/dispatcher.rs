//! The top-level registry of lazy member lists: one per channel (plus a
//! guild-wide `"everyone"` list, keyed by the guild's own id), created on
//! demand and routed to by guild-wide events.
//!
//! Grounded in the teacher's `Cache`: a handful of `dashmap::DashMap`
//! top-level collections guarded independently, so looking up or
//! lazy-creating one channel's list never blocks another's.

use std::sync::Arc;

use dashmap::DashMap;
use fxhash::FxBuildHasher;
use tracing::warn;

use crate::collab::{PresenceStore, SessionRegistry, Storage};
use crate::error::Result;
use crate::list::perm::permissions_for_roles;
use crate::list::{MemberList, Settings};
use crate::model::prelude::*;

/// Owns every channel's [`MemberList`] and routes guild-scoped events
/// (role lifecycle, presence updates) to each of a guild's lists.
pub struct LazyGuildDispatcher {
    channels: DashMap<ChannelId, Arc<MemberList>, FxBuildHasher>,
    guilds: DashMap<GuildId, Vec<ChannelId>, FxBuildHasher>,
    storage: Arc<dyn Storage>,
    presence: Arc<dyn PresenceStore>,
    sessions: Arc<dyn SessionRegistry>,
    settings: Settings,
}

impl LazyGuildDispatcher {
    #[must_use]
    pub fn new(
        storage: Arc<dyn Storage>,
        presence: Arc<dyn PresenceStore>,
        sessions: Arc<dyn SessionRegistry>,
        settings: Settings,
    ) -> Self {
        Self {
            channels: DashMap::default(),
            guilds: DashMap::default(),
            storage,
            presence,
            sessions,
            settings,
        }
    }

    /// Returns the `MemberList` a session asking for `channel_id` should
    /// actually talk to: the channel's own list, unless every member can
    /// already read the channel (the `@everyone` role has `read_messages`
    /// there), in which case the guild's `"everyone"` list is used instead
    /// and the per-channel list is left untouched.
    #[tracing::instrument(skip(self))]
    pub async fn get_gml(&self, channel_id: ChannelId) -> Result<Arc<MemberList>> {
        let guild_id = self.resolve_guild(channel_id).await?;
        let everyone_channel = ChannelId::new(guild_id.get());

        let target_channel = if channel_id == everyone_channel {
            channel_id
        } else {
            let roles = self.storage.fetch_roles(guild_id).await?;
            let overwrites = self.storage.chan_overwrites(channel_id).await?;
            let everyone_can_read =
                permissions_for_roles(&[], guild_id, &roles, &overwrites).read_messages();
            if everyone_can_read {
                everyone_channel
            } else {
                channel_id
            }
        };

        if let Some(list) = self.channels.get(&target_channel) {
            return Ok(Arc::clone(&list));
        }

        let list = Arc::new(MemberList::new(guild_id, target_channel, self.settings.clone()));
        self.channels.insert(target_channel, Arc::clone(&list));
        self.guilds.entry(guild_id).or_default().push(target_channel);
        Ok(list)
    }

    async fn resolve_guild(&self, channel_id: ChannelId) -> Result<GuildId> {
        match self.storage.guild_from_channel(channel_id).await? {
            Some(guild_id) => Ok(guild_id),
            None => Ok(GuildId::new(channel_id.get())),
        }
    }

    fn channels_of(&self, guild_id: GuildId) -> Vec<Arc<MemberList>> {
        self.guilds
            .get(&guild_id)
            .map(|ids| ids.iter().filter_map(|id| self.channels.get(id).map(|l| Arc::clone(&l))).collect())
            .unwrap_or_default()
    }

    /// Routes a role-creation event to every list of its guild.
    pub async fn new_role(&self, guild_id: GuildId, role: Role) {
        for list in self.channels_of(guild_id) {
            let outcome = list
                .new_role(role.clone(), Arc::clone(&self.storage), Arc::clone(&self.presence), Arc::clone(&self.sessions))
                .await;
            log_handler_error("new_role", outcome);
        }
    }

    /// Routes a role-edit event to every list of its guild.
    pub async fn role_update(&self, guild_id: GuildId, role: Role) {
        for list in self.channels_of(guild_id) {
            let outcome = list
                .role_update(role.clone(), Arc::clone(&self.storage), Arc::clone(&self.presence), Arc::clone(&self.sessions))
                .await;
            log_handler_error("role_update", outcome);
        }
    }

    /// Routes a role-reorder event to every list of its guild.
    pub async fn role_pos_update(&self, guild_id: GuildId, role_id: RoleId, new_position: i64) {
        for list in self.channels_of(guild_id) {
            let outcome = list
                .role_pos_update(
                    role_id,
                    new_position,
                    Arc::clone(&self.storage),
                    Arc::clone(&self.presence),
                    Arc::clone(&self.sessions),
                )
                .await;
            log_handler_error("role_pos_update", outcome);
        }
    }

    /// Routes a role-deletion event to every list of its guild.
    pub async fn role_delete(&self, guild_id: GuildId, role_id: RoleId) {
        for list in self.channels_of(guild_id) {
            let outcome = list
                .role_delete(role_id, Arc::clone(&self.storage), Arc::clone(&self.presence), Arc::clone(&self.sessions))
                .await;
            log_handler_error("role_delete", outcome);
        }
    }

    /// Routes a presence update to every list of its guild.
    pub async fn pres_update(&self, guild_id: GuildId, member_id: UserId, partial: PartialPresence) {
        for list in self.channels_of(guild_id) {
            let outcome = list
                .pres_update(
                    member_id,
                    partial.clone(),
                    Arc::clone(&self.storage),
                    Arc::clone(&self.presence),
                    Arc::clone(&self.sessions),
                )
                .await;
            log_handler_error("pres_update", outcome);
        }
    }

    /// Subscribes a session to ranges on a channel's list, creating it if
    /// this is its first subscriber.
    pub async fn shard_query(
        &self,
        channel_id: ChannelId,
        session_id: SessionId,
        ranges: &[(i64, i64)],
    ) -> Result<Vec<SessionId>> {
        let list = self.get_gml(channel_id).await?;
        list.shard_query(session_id, ranges, Arc::clone(&self.storage), Arc::clone(&self.presence), Arc::clone(&self.sessions))
            .await
    }

    /// Drops a session's subscription from a channel's list, if present.
    pub async fn unsub(&self, channel_id: ChannelId, session_id: &SessionId) {
        if let Some(list) = self.channels.get(&channel_id) {
            list.unsub(session_id).await;
        }
    }

    /// Entry point for a named event dispatched from the gateway layer.
    /// Unknown event names are logged and ignored.
    pub async fn dispatch(&self, guild_id: GuildId, event: &str, payload: DispatchPayload) {
        match (event, payload) {
            ("GUILD_ROLE_CREATE", DispatchPayload::Role(role)) => self.new_role(guild_id, role).await,
            ("GUILD_ROLE_UPDATE", DispatchPayload::Role(role)) => self.role_update(guild_id, role).await,
            ("GUILD_ROLE_DELETE", DispatchPayload::RoleId(role_id)) => self.role_delete(guild_id, role_id).await,
            ("GUILD_ROLE_POSITION_UPDATE", DispatchPayload::RolePosition(role_id, position)) => {
                self.role_pos_update(guild_id, role_id, position).await;
            }
            ("PRESENCE_UPDATE", DispatchPayload::Presence(member_id, partial)) => {
                self.pres_update(guild_id, member_id, partial).await;
            }
            (other, _) => warn!(event = other, "dispatcher: unknown event ignored"),
        }
    }
}

/// The payload carried by a [`LazyGuildDispatcher::dispatch`] call. Kept as
/// a small enum rather than untyped JSON so callers get compile-time
/// checking that they paired the right event name with the right data.
#[derive(Clone, Debug)]
pub enum DispatchPayload {
    Role(Role),
    RoleId(RoleId),
    RolePosition(RoleId, i64),
    Presence(UserId, PartialPresence),
}

fn log_handler_error(handler: &'static str, outcome: Result<Vec<SessionId>>) {
    if let Err(err) = outcome {
        warn!(handler, %err, "guild-wide dispatch: list handler failed");
    }
}
