//! The lazy member list engine: per-channel grouped, ordered membership
//! state plus the range-subscription and operation-dispatch machinery built
//! on top of it.
//!
//! Mirrors the shape of the teacher's `cache` module: a single state
//! container (here, one per channel rather than one per client) guarded by
//! an async-aware lock, with a neighbouring `Settings` struct controlling
//! tunables.

pub mod group;
pub mod op;
pub mod perm;
pub mod settings;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::collab::{PresenceStore, SessionRegistry, Storage};
use crate::error::Result;
use crate::list::group::{assign_group, build_groups, Gid, GroupInfo};
use crate::list::op::{build_member_item, build_payload, Item, Operation};
use crate::list::perm::{member_permissions, mix_with_overwrite, permissions_for_roles};
pub use crate::list::settings::Settings;
use crate::model::prelude::*;

/// The fully materialized state of an initialized channel list.
#[derive(Clone, Debug)]
pub struct ReadyState {
    pub groups: Vec<GroupInfo>,
    pub data: HashMap<Gid, Vec<UserId>>,
    pub members: HashMap<UserId, Member>,
    pub presences: HashMap<UserId, Presence>,
    pub roles: Vec<Role>,
    pub overwrites: HashMap<RoleId, PermissionOverwrite>,
}

/// Whether a channel list currently holds materialized membership state.
#[derive(Clone, Debug, Default)]
pub enum ListState {
    #[default]
    Empty,
    Ready(ReadyState),
}

impl ListState {
    #[must_use]
    pub fn as_ready(&self) -> Option<&ReadyState> {
        match self {
            Self::Ready(state) => Some(state),
            Self::Empty => None,
        }
    }

    #[must_use]
    pub fn as_ready_mut(&mut self) -> Option<&mut ReadyState> {
        match self {
            Self::Ready(state) => Some(state),
            Self::Empty => None,
        }
    }
}

struct Inner {
    state: ListState,
    subs: HashMap<SessionId, Vec<(i64, i64)>>,
}

/// A single channel's (or a guild's `"everyone"` list's) lazy member list.
///
/// All mutation and every dispatch decision happens under `inner`'s lock,
/// held from handler entry through payload construction, matching the
/// per-list critical section the concurrency design requires.
pub struct MemberList {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    inner: Mutex<Inner>,
    settings: Settings,
}

impl MemberList {
    #[must_use]
    pub fn new(guild_id: GuildId, channel_id: ChannelId, settings: Settings) -> Self {
        Self {
            guild_id,
            channel_id,
            inner: Mutex::new(Inner { state: ListState::Empty, subs: HashMap::new() }),
            settings,
        }
    }

    fn list_id(&self) -> String {
        if self.channel_id.get() == self.guild_id.get() {
            "everyone".to_owned()
        } else {
            self.channel_id.to_string()
        }
    }

    async fn ensure_init_locked(
        &self,
        inner: &mut Inner,
        storage: &dyn Storage,
        presence_store: &dyn PresenceStore,
    ) -> Result<()> {
        if matches!(inner.state, ListState::Empty) {
            let ready = init_ready_state(self.guild_id, self.channel_id, storage, presence_store).await?;
            debug!(guild_id = %self.guild_id, channel_id = %self.channel_id, members = ready.members.len(), "member list initialized");
            inner.state = ListState::Ready(ready);
        }
        Ok(())
    }

    async fn snapshot_for_payload(&self) -> Option<(String, Vec<(GroupInfo, usize)>)> {
        let guard = self.inner.lock().await;
        let ready = guard.state.as_ready()?;
        let group_counts = ready
            .groups
            .iter()
            .map(|g| (g.clone(), ready.data.get(&g.gid).map(Vec::len).unwrap_or(0)))
            .collect();
        Some((self.list_id(), group_counts))
    }

    async fn dispatch_ops(
        &self,
        ops: Vec<Operation>,
        targets: Vec<SessionId>,
        sessions: &dyn SessionRegistry,
    ) -> Vec<SessionId> {
        if targets.is_empty() || ops.is_empty() {
            return vec![];
        }
        let Some((list_id, group_counts)) = self.snapshot_for_payload().await else {
            return vec![];
        };
        let payload = build_payload(&list_id, self.guild_id, &group_counts, &ops);

        let mut dispatched = Vec::new();
        for session_id in targets {
            if let Some(handle) = sessions.fetch_raw(&session_id).await {
                handle.dispatch("GUILD_MEMBER_LIST_UPDATE", payload.clone()).await;
                dispatched.push(session_id);
            }
        }
        dispatched
    }

    /// Subscribes `session_id` to the given index ranges and immediately
    /// delivers a `SYNC` payload covering each valid one.
    #[tracing::instrument(skip(self, storage, presence_store, sessions))]
    pub async fn shard_query(
        self: &Arc<Self>,
        session_id: SessionId,
        ranges: &[(i64, i64)],
        storage: Arc<dyn Storage>,
        presence_store: Arc<dyn PresenceStore>,
        sessions: Arc<dyn SessionRegistry>,
    ) -> Result<Vec<SessionId>> {
        let mut guard = self.inner.lock().await;
        self.ensure_init_locked(&mut guard, &*storage, &*presence_store).await?;

        let Some(ready) = guard.state.as_ready() else {
            return Ok(vec![]);
        };
        let items = flatten(ready);

        let mut ops = Vec::new();
        for &(start, end) in ranges {
            if end < start {
                debug!(start, end, "shard_query: dropping invalid range");
                continue;
            }
            guard.subs.entry(session_id.clone()).or_default().push((start, end));
            let lo = start.max(0) as usize;
            let hi = usize::try_from(end.saturating_add(1)).unwrap_or(items.len()).min(items.len());
            let slice = if lo < items.len() { items[lo..hi].to_vec() } else { Vec::new() };
            ops.push(Operation::Sync { range: (start, end), items: slice });
        }

        if ops.is_empty() {
            return Ok(vec![]);
        }

        let group_counts: Vec<(GroupInfo, usize)> = guard
            .state
            .as_ready()
            .map(|ready| {
                ready
                    .groups
                    .iter()
                    .map(|g| (g.clone(), ready.data.get(&g.gid).map(Vec::len).unwrap_or(0)))
                    .collect()
            })
            .unwrap_or_default();
        let payload = build_payload(&self.list_id(), self.guild_id, &group_counts, &ops);
        drop(guard);

        if let Some(handle) = sessions.fetch_raw(&session_id).await {
            handle.dispatch("GUILD_MEMBER_LIST_UPDATE", payload).await;
            Ok(vec![session_id])
        } else {
            Ok(vec![])
        }
    }

    /// Removes a session's subscription; empties the list state once no
    /// subscriber remains, leaving the container resident for future subs.
    #[tracing::instrument(skip(self))]
    pub async fn unsub(&self, session_id: &SessionId) {
        let mut guard = self.inner.lock().await;
        guard.subs.remove(session_id);
        if guard.subs.is_empty() {
            debug!(guild_id = %self.guild_id, channel_id = %self.channel_id, "last subscriber left, resetting list state");
            guard.state = ListState::Empty;
        }
    }

    /// Schedules a resync (a fresh `shard_query` over the bracketing range)
    /// for every session whose subscribed range covers `item_index`.
    async fn resync(
        self: &Arc<Self>,
        item_index: i64,
        storage: Arc<dyn Storage>,
        presence_store: Arc<dyn PresenceStore>,
        sessions: Arc<dyn SessionRegistry>,
    ) {
        let targets = {
            let guard = self.inner.lock().await;
            bracket_ranges_for(&guard.subs, item_index)
        };

        for (session_id, range) in targets {
            debug!(%session_id, item_index, "scheduling resync");
            let list = Arc::clone(self);
            let storage = Arc::clone(&storage);
            let presence_store = Arc::clone(&presence_store);
            let sessions = Arc::clone(&sessions);
            tokio::spawn(async move {
                if sessions.fetch_raw(&session_id).await.is_none() {
                    return;
                }
                if let Err(err) = list.shard_query(session_id, &[range], storage, presence_store, sessions).await {
                    warn!(%err, "resync: shard_query failed");
                }
            });
        }
    }

    /// Applies a presence change, choosing between a single `UPDATE` (simple
    /// case) and a group-relocation path (complex case) that by default
    /// discards its precise op computation in favour of resyncing the
    /// affected ranges. See [`Settings::precise_complex_ops`].
    #[tracing::instrument(skip(self, partial, storage, presence_store, sessions))]
    pub async fn pres_update(
        self: &Arc<Self>,
        member_id: UserId,
        partial: PartialPresence,
        storage: Arc<dyn Storage>,
        presence_store: Arc<dyn PresenceStore>,
        sessions: Arc<dyn SessionRegistry>,
    ) -> Result<Vec<SessionId>> {
        enum Outcome {
            Simple { index: i64, item: Box<Item> },
            Complex { old_index: i64, new_index: Option<i64>, precise_ops: Option<Vec<Operation>> },
        }

        let outcome = {
            let mut guard = self.inner.lock().await;
            self.ensure_init_locked(&mut guard, &*storage, &*presence_store).await?;
            let Some(ready) = guard.state.as_ready_mut() else {
                return Ok(vec![]);
            };

            let Some((old_group, old_index)) = locate_member(ready, member_id) else {
                warn!(%member_id, "pres_update: member not present in any group, list may be unstable");
                return Ok(vec![]);
            };

            let stored = ready.presences.get(&member_id).cloned().unwrap_or(Presence {
                status: OnlineStatus::Offline,
                activities: vec![],
                roles: vec![],
            });
            let merged = partial.merge_onto(&stored);
            let can_read =
                permissions_for_roles(&merged.roles, self.guild_id, &ready.roles, &ready.overwrites).read_messages();
            let new_group = assign_group(can_read, &ready.groups, &merged.roles, merged.status);

            if new_group == Some(old_group) && !partial.has_nick() {
                ready.presences.insert(member_id, merged.clone());
                let item = ready
                    .members
                    .get(&member_id)
                    .map(|m| build_member_item(m, &merged))
                    .expect("member in data is always present in members (I1)");
                Outcome::Simple { index: old_index as i64, item: Box::new(item) }
            } else {
                let old_header_idx = group_header_index(ready, old_group);

                if let Some(ids) = ready.data.get_mut(&old_group) {
                    ids.retain(|id| *id != member_id);
                }
                let old_group_now_empty = ready.data.get(&old_group).map_or(true, Vec::is_empty);

                if let Some(nick) = partial.nick.clone() {
                    if let Some(member) = ready.members.get_mut(&member_id) {
                        member.nick = nick;
                    }
                }
                ready.presences.insert(member_id, merged);

                if let Some(gid) = new_group {
                    ready.data.entry(gid).or_default().push(member_id);
                    if let Some(ids) = ready.data.get_mut(&gid) {
                        sort_by_display_name(ids, &ready.members);
                    }
                }
                if let Some(ids) = ready.data.get_mut(&old_group) {
                    sort_by_display_name(ids, &ready.members);
                }

                let new_index = locate_member(ready, member_id).map(|(_, idx)| idx as i64);

                let precise_ops = self.settings.precise_complex_ops.then(|| {
                    build_precise_ops(ready, member_id, old_group, old_index, old_header_idx, old_group_now_empty)
                });

                Outcome::Complex { old_index: old_index as i64, new_index, precise_ops }
            }
        };

        match outcome {
            Outcome::Simple { index, item } => {
                let targets = {
                    let guard = self.inner.lock().await;
                    subs_covering(&guard.subs, index)
                };
                let ops = vec![Operation::Update { index, item: *item }];
                Ok(self.dispatch_ops(ops, targets, &*sessions).await)
            }
            Outcome::Complex { old_index, new_index, precise_ops } => {
                if let Some(ops) = precise_ops {
                    let targets = {
                        let guard = self.inner.lock().await;
                        let mut targets = subs_covering(&guard.subs, old_index);
                        if let Some(ni) = new_index {
                            for session_id in subs_covering(&guard.subs, ni) {
                                if !targets.contains(&session_id) {
                                    targets.push(session_id);
                                }
                            }
                        }
                        targets
                    };
                    Ok(self.dispatch_ops(ops, targets, &*sessions).await)
                } else {
                    self.resync(old_index, Arc::clone(&storage), Arc::clone(&presence_store), Arc::clone(&sessions))
                        .await;
                    if let Some(new_index) = new_index {
                        if new_index != old_index {
                            self.resync(new_index, storage, presence_store, sessions).await;
                        }
                    }
                    Ok(vec![])
                }
            }
        }
    }

    /// Registers a newly hoisted role as a group, if it can read the
    /// channel after overwrite mixing. A no-op on an uninitialized list: the
    /// next `shard_query` will build its groups from the current role table
    /// anyway, so there is nothing here worth a storage/presence round-trip.
    #[tracing::instrument(skip(self, storage, _presence_store, _sessions))]
    pub async fn new_role(
        self: &Arc<Self>,
        role: Role,
        storage: Arc<dyn Storage>,
        _presence_store: Arc<dyn PresenceStore>,
        _sessions: Arc<dyn SessionRegistry>,
    ) -> Result<Vec<SessionId>> {
        let mut guard = self.inner.lock().await;
        let Some(ready) = guard.state.as_ready_mut() else {
            return Ok(vec![]);
        };

        if !role.hoist {
            return Ok(vec![]);
        }

        ready.overwrites = storage.chan_overwrites(self.channel_id).await?;
        let mixed = mix_with_overwrite(role.permissions, &ready.overwrites, role.id);
        if !mixed.read_messages() {
            debug!(role_id = %role.id, "new_role rejected: no read_messages after overwrite mix");
            return Ok(vec![]);
        }

        let insert_at = ready
            .groups
            .iter()
            .take_while(|g| matches!(g.gid, Gid::Role(_)) && g.position > role.position)
            .count();
        ready.groups.insert(
            insert_at,
            GroupInfo { gid: Gid::Role(role.id), name: role.name.clone(), position: role.position, permissions: mixed },
        );
        ready.data.insert(Gid::Role(role.id), Vec::new());
        ready.roles.push(role.clone());

        info!(role_id = %role.id, "new_role accepted as group");
        Ok(vec![])
    }

    /// Applies a role edit: promotes a freshly-hoisted role to a group,
    /// demotes a group whose role lost `read_messages` or its hoist flag,
    /// or simply refreshes an existing group's cached fields.
    #[tracing::instrument(skip(self, storage, presence_store, sessions))]
    pub async fn role_update(
        self: &Arc<Self>,
        role: Role,
        storage: Arc<dyn Storage>,
        presence_store: Arc<dyn PresenceStore>,
        sessions: Arc<dyn SessionRegistry>,
    ) -> Result<Vec<SessionId>> {
        let mut guard = self.inner.lock().await;
        let Some(ready) = guard.state.as_ready_mut() else {
            return Ok(vec![]);
        };

        let is_group = ready.groups.iter().any(|g| g.gid == Gid::Role(role.id));

        if !is_group {
            if role.hoist {
                drop(guard);
                return self.new_role(role, storage, presence_store, sessions).await;
            }
            return Ok(vec![]);
        }

        ready.overwrites = storage.chan_overwrites(self.channel_id).await?;
        let mixed = mix_with_overwrite(role.permissions, &ready.overwrites, role.id);
        if !mixed.read_messages() || !role.hoist {
            drop(guard);
            return self.role_delete(role.id, storage, presence_store, sessions).await;
        }

        if let Some(stored) = ready.roles.iter_mut().find(|r| r.id == role.id) {
            *stored = role.clone();
        }
        if let Some(group) = ready.groups.iter_mut().find(|g| g.gid == Gid::Role(role.id)) {
            group.name = role.name.clone();
            group.permissions = mixed;
        }

        info!(role_id = %role.id, "role_update applied in place");
        Ok(vec![])
    }

    /// Moves a group to its role's new position and resyncs any session
    /// watching the header's old or new item index.
    #[tracing::instrument(skip(self, storage, presence_store, sessions))]
    pub async fn role_pos_update(
        self: &Arc<Self>,
        role_id: RoleId,
        new_position: i64,
        storage: Arc<dyn Storage>,
        presence_store: Arc<dyn PresenceStore>,
        sessions: Arc<dyn SessionRegistry>,
    ) -> Result<Vec<SessionId>> {
        let (old_header_idx, new_header_idx) = {
            let mut guard = self.inner.lock().await;
            let Some(ready) = guard.state.as_ready_mut() else {
                return Ok(vec![]);
            };
            if !ready.groups.iter().any(|g| g.gid == Gid::Role(role_id)) {
                return Ok(vec![]);
            }

            let old_header_idx = group_header_index(ready, Gid::Role(role_id));

            if let Some(group) = ready.groups.iter_mut().find(|g| g.gid == Gid::Role(role_id)) {
                group.position = new_position;
            }
            if let Some(role) = ready.roles.iter_mut().find(|r| r.id == role_id) {
                role.position = new_position;
            }
            resort_groups(&mut ready.groups);

            let new_header_idx = group_header_index(ready, Gid::Role(role_id));
            (old_header_idx, new_header_idx)
        };

        if let Some(idx) = old_header_idx {
            self.resync(idx as i64, Arc::clone(&storage), Arc::clone(&presence_store), Arc::clone(&sessions)).await;
        }
        if let Some(idx) = new_header_idx {
            if Some(idx) != old_header_idx {
                self.resync(idx as i64, storage, presence_store, sessions).await;
            }
        }
        Ok(vec![])
    }

    /// Removes a group, reassigns its orphaned members into another group
    /// via [`assign_group`], and resyncs sessions that were watching its
    /// (now-gone) header.
    #[tracing::instrument(skip(self, storage, presence_store, sessions))]
    pub async fn role_delete(
        self: &Arc<Self>,
        role_id: RoleId,
        storage: Arc<dyn Storage>,
        presence_store: Arc<dyn PresenceStore>,
        sessions: Arc<dyn SessionRegistry>,
    ) -> Result<Vec<SessionId>> {
        let header_idx = {
            let mut guard = self.inner.lock().await;
            let Some(ready) = guard.state.as_ready_mut() else {
                return Ok(vec![]);
            };
            if !ready.groups.iter().any(|g| g.gid == Gid::Role(role_id)) {
                return Ok(vec![]);
            }

            let header_idx = group_header_index(ready, Gid::Role(role_id));

            ready.groups.retain(|g| g.gid != Gid::Role(role_id));
            ready.roles.retain(|r| r.id != role_id);
            ready.overwrites.remove(&role_id);
            let orphans = ready.data.remove(&Gid::Role(role_id)).unwrap_or_default();

            for member_id in orphans {
                let (status, member_roles) = ready
                    .presences
                    .get(&member_id)
                    .map(|p| (p.status, p.roles.clone()))
                    .unwrap_or((OnlineStatus::Offline, Vec::new()));
                let can_read =
                    permissions_for_roles(&member_roles, self.guild_id, &ready.roles, &ready.overwrites).read_messages();
                if let Some(gid) = assign_group(can_read, &ready.groups, &member_roles, status) {
                    ready.data.entry(gid).or_default().push(member_id);
                }
            }
            for ids in ready.data.values_mut() {
                sort_by_display_name(ids, &ready.members);
            }

            info!(role_id = %role_id, "role_delete applied, orphans reassigned");
            header_idx
        };

        if let Some(idx) = header_idx {
            self.resync(idx as i64, storage, presence_store, sessions).await;
        }
        Ok(vec![])
    }
}

async fn init_ready_state(
    guild_id: GuildId,
    channel_id: ChannelId,
    storage: &dyn Storage,
    presence_store: &dyn PresenceStore,
) -> Result<ReadyState> {
    let member_ids = storage.get_member_ids(guild_id).await?;
    let presences = presence_store.guild_presences(&member_ids, guild_id).await?;
    let roles = storage.fetch_roles(guild_id).await?;
    let overwrites = storage.chan_overwrites(channel_id).await?;
    let member_data = storage.get_member_data(guild_id).await?;

    let groups = build_groups(&roles, &overwrites);
    let mut data: HashMap<Gid, Vec<UserId>> = groups.iter().map(|g| (g.gid, Vec::new())).collect();
    let mut members = HashMap::new();

    for member_id in &member_ids {
        let (Some(snapshot), Some(presence)) = (member_data.get(member_id), presences.get(member_id)) else {
            continue;
        };
        let can_read = member_permissions(snapshot, guild_id, &roles, &overwrites).read_messages();
        let Some(gid) = assign_group(can_read, &groups, &presence.roles, presence.status) else {
            continue;
        };
        data.entry(gid).or_default().push(*member_id);
        members.insert(*member_id, snapshot.clone());
    }

    for ids in data.values_mut() {
        sort_by_display_name(ids, &members);
    }

    Ok(ReadyState { groups, data, members, presences, roles, overwrites })
}

/// Flattens group + member state into the item sequence delivered to
/// clients: a header for every non-empty group (always for `offline`),
/// followed by its members in sorted order.
#[must_use]
pub fn flatten(state: &ReadyState) -> Vec<Item> {
    let mut items = Vec::new();
    for group in &state.groups {
        let members = state.data.get(&group.gid).map(Vec::as_slice).unwrap_or(&[]);
        let emit_header = !members.is_empty() || group.gid == Gid::Offline;
        if !emit_header {
            continue;
        }
        items.push(Item::GroupHeader { gid: group.gid, count: members.len() });
        for member_id in members {
            if let (Some(member), Some(presence)) = (state.members.get(member_id), state.presences.get(member_id)) {
                items.push(build_member_item(member, presence));
            }
        }
    }
    items
}

fn locate_member(state: &ReadyState, member_id: UserId) -> Option<(Gid, usize)> {
    let mut idx = 0usize;
    for group in &state.groups {
        let members = state.data.get(&group.gid).map(Vec::as_slice).unwrap_or(&[]);
        let emit_header = !members.is_empty() || group.gid == Gid::Offline;
        if emit_header {
            idx += 1;
        }
        if let Some(pos) = members.iter().position(|id| *id == member_id) {
            return Some((group.gid, idx + pos));
        }
        idx += members.len();
    }
    None
}

fn group_header_index(state: &ReadyState, target: Gid) -> Option<usize> {
    let mut idx = 0usize;
    for group in &state.groups {
        let members = state.data.get(&group.gid).map(Vec::as_slice).unwrap_or(&[]);
        let emit_header = !members.is_empty() || group.gid == Gid::Offline;
        if group.gid == target {
            return emit_header.then_some(idx);
        }
        if emit_header {
            idx += 1;
        }
        idx += members.len();
    }
    None
}

fn subs_covering(subs: &HashMap<SessionId, Vec<(i64, i64)>>, idx: i64) -> Vec<SessionId> {
    subs.iter()
        .filter(|(_, ranges)| ranges.iter().any(|(s, e)| *s <= idx && idx <= *e))
        .map(|(session_id, _)| session_id.clone())
        .collect()
}

fn bracket_ranges_for(subs: &HashMap<SessionId, Vec<(i64, i64)>>, idx: i64) -> Vec<(SessionId, (i64, i64))> {
    subs.iter()
        .filter_map(|(session_id, ranges)| {
            ranges.iter().find(|(s, e)| *s <= idx && idx <= *e).map(|range| (session_id.clone(), *range))
        })
        .collect()
}

fn resort_groups(groups: &mut [GroupInfo]) {
    groups.sort_by(|a, b| {
        let rank = |g: &GroupInfo| match g.gid {
            Gid::Role(_) => 0,
            Gid::Online => 1,
            Gid::Offline => 2,
        };
        rank(a).cmp(&rank(b)).then_with(|| b.position.cmp(&a.position))
    });
}

/// Sorts member ids by display name ascending; a member with no known
/// snapshot (should not happen under invariant I1, but may transiently
/// during a resort in progress) sorts after all named members, in id order.
fn sort_by_display_name(ids: &mut [UserId], members: &HashMap<UserId, Member>) {
    ids.sort_by(|a, b| match (members.get(a).map(Member::display_name), members.get(b).map(Member::display_name)) {
        (Some(da), Some(db)) => da.cmp(db).then_with(|| a.cmp(b)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.cmp(b),
    });
}

/// Builds the index-precise `DELETE`/`INSERT` op pair (plus group-header
/// ops, where a header appeared or disappeared) for a presence-driven
/// relocation. Operates on the already-mutated state; `old_index` and
/// `old_header_idx` must be captured by the caller against the
/// pre-mutation state, since the mutation shifts everything after it.
///
/// This is the data [`MemberList::pres_update`]'s default (resync) path
/// discards; it is exercised directly by this crate's own tests and by
/// callers that opt into [`Settings::precise_complex_ops`].
#[must_use]
pub fn build_precise_ops(
    after: &ReadyState,
    member_id: UserId,
    old_group: Gid,
    old_index: usize,
    old_header_idx: Option<usize>,
    old_group_now_empty: bool,
) -> Vec<Operation> {
    let mut ops = vec![Operation::Delete { index: old_index as i64 }];

    if old_group_now_empty && old_group != Gid::Offline {
        if let Some(header_idx) = old_header_idx {
            ops.push(Operation::Delete { index: header_idx as i64 });
        }
    }

    if let Some((new_group, new_index)) = locate_member(after, member_id) {
        let members = after.data.get(&new_group).map(Vec::as_slice).unwrap_or(&[]);
        if members.len() == 1 && new_group != Gid::Offline {
            if let Some(header_idx) = group_header_index(after, new_group) {
                ops.push(Operation::Insert {
                    index: header_idx as i64,
                    item: Item::GroupHeader { gid: new_group, count: 1 },
                });
            }
        }
        if let (Some(member), Some(presence)) = (after.members.get(&member_id), after.presences.get(&member_id)) {
            ops.push(Operation::Insert { index: new_index as i64, item: build_member_item(member, presence) });
        }
    }

    ops
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(gid: Gid, name: &str, position: i64) -> GroupInfo {
        GroupInfo { gid, name: name.to_owned(), position, permissions: Permissions::READ_MESSAGES }
    }

    fn member(id: u64, name: &str) -> Member {
        Member { user: User { id: UserId::new(id), name: name.to_owned() }, nick: None, roles: vec![] }
    }

    fn online(roles: Vec<RoleId>) -> Presence {
        Presence { status: OnlineStatus::Online, activities: vec![], roles }
    }

    /// A relocation that empties the source group and fills a previously
    /// empty destination group must emit both a header `DELETE` for the
    /// now-empty source and a header `INSERT` for the newly-visible
    /// destination, not just the member's own `DELETE`/`INSERT` pair.
    #[test]
    fn build_precise_ops_includes_header_delete_when_source_group_empties() {
        let mover = UserId::new(1);
        let mods = Gid::Role(RoleId::new(100));

        let after = ReadyState {
            groups: vec![group(mods, "mods", 5), group(Gid::Online, "online", 251), group(Gid::Offline, "offline", 252)],
            data: HashMap::from([(mods, vec![]), (Gid::Online, vec![mover]), (Gid::Offline, vec![])]),
            members: HashMap::from([(mover, member(1, "alice"))]),
            presences: HashMap::from([(mover, online(vec![]))]),
            roles: vec![],
            overwrites: HashMap::new(),
        };

        // Pre-mutation: `mods` had exactly `mover` as its one member, so its
        // header sat at flattened index 0.
        let ops = build_precise_ops(&after, mover, mods, 1, Some(0), true);

        assert_eq!(ops.len(), 4);
        assert!(matches!(ops[0], Operation::Delete { index: 1 }), "member delete at its old index");
        assert!(matches!(ops[1], Operation::Delete { index: 0 }), "mods header delete, now empty");
        assert!(
            matches!(ops[2], Operation::Insert { index: 0, item: Item::GroupHeader { gid: Gid::Online, count: 1 } }),
            "online header insert, now non-empty"
        );
        assert!(matches!(ops[3], Operation::Insert { index: 1, .. }), "member insert at its new index");
    }

    /// A relocation between two already-populated groups emits only the
    /// member's own `DELETE`/`INSERT` pair: neither header changes
    /// visibility.
    #[test]
    fn build_precise_ops_omits_header_ops_when_neither_group_changes_visibility() {
        let mover = UserId::new(1);
        let stays_behind = UserId::new(2);
        let already_online = UserId::new(3);
        let mods = Gid::Role(RoleId::new(100));

        let after = ReadyState {
            groups: vec![group(mods, "mods", 5), group(Gid::Online, "online", 251), group(Gid::Offline, "offline", 252)],
            data: HashMap::from([
                (mods, vec![stays_behind]),
                (Gid::Online, vec![already_online, mover]),
                (Gid::Offline, vec![]),
            ]),
            members: HashMap::from([
                (mover, member(1, "zzz")),
                (stays_behind, member(2, "bob")),
                (already_online, member(3, "aaa")),
            ]),
            presences: HashMap::from([
                (mover, online(vec![])),
                (stays_behind, online(vec![])),
                (already_online, online(vec![])),
            ]),
            roles: vec![],
            overwrites: HashMap::new(),
        };

        let ops = build_precise_ops(&after, mover, mods, 1, Some(0), false);

        assert_eq!(ops.len(), 2);
        assert!(matches!(ops[0], Operation::Delete { index: 1 }));
        assert!(matches!(ops[1], Operation::Insert { index: 4, .. }));
    }
}
