//! Hand-written in-memory fakes of the collaborator traits, in the style of
//! the teacher's own `tests/test_cache.rs` fixtures (no mocking framework).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lazy_guild::collab::{PresenceStore, SessionHandle, SessionRegistry, Storage};
use lazy_guild::error::Result;
use lazy_guild::model::prelude::*;

#[derive(Default)]
pub struct FakeStorage {
    pub members: HashMap<GuildId, Vec<UserId>>,
    pub member_data: HashMap<GuildId, HashMap<UserId, Member>>,
    pub roles: HashMap<GuildId, Vec<Role>>,
    pub overwrites: HashMap<ChannelId, HashMap<RoleId, PermissionOverwrite>>,
    pub channel_guild: HashMap<ChannelId, GuildId>,
}

#[async_trait]
impl Storage for FakeStorage {
    async fn get_member_ids(&self, guild: GuildId) -> Result<Vec<UserId>> {
        Ok(self.members.get(&guild).cloned().unwrap_or_default())
    }

    async fn get_member_data(&self, guild: GuildId) -> Result<HashMap<UserId, Member>> {
        Ok(self.member_data.get(&guild).cloned().unwrap_or_default())
    }

    async fn get_member_data_one(&self, guild: GuildId, member: UserId) -> Result<Member> {
        self.member_data
            .get(&guild)
            .and_then(|m| m.get(&member))
            .cloned()
            .ok_or(lazy_guild::error::Error::UnknownEntity("member"))
    }

    async fn chan_overwrites(&self, channel: ChannelId) -> Result<HashMap<RoleId, PermissionOverwrite>> {
        Ok(self.overwrites.get(&channel).cloned().unwrap_or_default())
    }

    async fn guild_from_channel(&self, channel: ChannelId) -> Result<Option<GuildId>> {
        Ok(self.channel_guild.get(&channel).copied())
    }

    async fn fetch_roles(&self, guild: GuildId) -> Result<Vec<Role>> {
        Ok(self.roles.get(&guild).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct FakePresence {
    pub presences: HashMap<UserId, Presence>,
}

#[async_trait]
impl PresenceStore for FakePresence {
    async fn guild_presences(&self, member_ids: &[UserId], _guild: GuildId) -> Result<HashMap<UserId, Presence>> {
        Ok(member_ids
            .iter()
            .filter_map(|id| self.presences.get(id).map(|p| (*id, p.clone())))
            .collect())
    }
}

pub struct FakeSessionHandle {
    pub session_id: SessionId,
    pub sink: Arc<Mutex<Vec<(SessionId, serde_json::Value)>>>,
}

#[async_trait]
impl SessionHandle for FakeSessionHandle {
    async fn dispatch(&self, _event: &str, payload: serde_json::Value) {
        self.sink.lock().expect("sink mutex poisoned").push((self.session_id.clone(), payload));
    }
}

#[derive(Default)]
pub struct FakeSessionRegistry {
    pub dispatched: Arc<Mutex<Vec<(SessionId, serde_json::Value)>>>,
    pub disconnected: Mutex<Vec<SessionId>>,
}

#[async_trait]
impl SessionRegistry for FakeSessionRegistry {
    async fn fetch_raw(&self, session_id: &SessionId) -> Option<Arc<dyn SessionHandle>> {
        if self.disconnected.lock().expect("poisoned").contains(session_id) {
            return None;
        }
        Some(Arc::new(FakeSessionHandle { session_id: session_id.clone(), sink: Arc::clone(&self.dispatched) }))
    }
}

impl FakeSessionRegistry {
    pub fn payloads_for(&self, session_id: &SessionId) -> Vec<serde_json::Value> {
        self.dispatched
            .lock()
            .expect("poisoned")
            .iter()
            .filter(|(id, _)| id == session_id)
            .map(|(_, payload)| payload.clone())
            .collect()
    }
}

pub fn member(id: u64, name: &str, roles: Vec<RoleId>) -> Member {
    Member { user: User { id: UserId::new(id), name: name.to_owned() }, nick: None, roles }
}

pub fn presence(status: OnlineStatus, roles: Vec<RoleId>) -> Presence {
    Presence { status, activities: vec![], roles }
}

pub fn role(id: u64, name: &str, hoist: bool, permissions: Permissions, position: i64) -> Role {
    Role { id: RoleId::new(id), name: name.to_owned(), hoist, permissions, position }
}

/// The `@everyone` role, conventionally sharing the guild's own id, granting
/// baseline `READ_MESSAGES` the way a freshly created guild's default role
/// does. Test fixtures that want a member to be list-visible without a
/// dedicated hoisted role attach this role id to both the member and their
/// presence.
pub fn everyone_role(guild_id: GuildId) -> Role {
    Role {
        id: RoleId::new(guild_id.get()),
        name: "@everyone".to_owned(),
        hoist: false,
        permissions: Permissions::READ_MESSAGES,
        position: 0,
    }
}
