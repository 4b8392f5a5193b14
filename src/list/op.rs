//! Operation and item wire shapes, and the `GUILD_MEMBER_LIST_UPDATE`
//! envelope they're delivered in.

use serde_json::{json, Value};

use crate::list::group::{Gid, GroupInfo};
use crate::model::prelude::*;

/// A single entry in the flattened item sequence: a group header or a
/// member row.
#[derive(Clone, Debug)]
pub enum Item {
    GroupHeader { gid: Gid, count: usize },
    Member(Value),
}

impl Item {
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::GroupHeader { gid, count } => json!({
                "group": { "id": gid.to_string(), "count": count }
            }),
            Self::Member(value) => json!({ "member": value }),
        }
    }
}

/// Builds a member row's payload: the member snapshot with a compact
/// presence object overlaid under `presence`, matching
/// `{ user:{id}, status, game, activities }`.
#[must_use]
pub fn build_member_item(member: &Member, presence: &Presence) -> Item {
    let mut value = serde_json::to_value(member).expect("Member always serializes");
    if let Value::Object(ref mut map) = value {
        map.insert(
            "presence".to_owned(),
            json!({
                "user": { "id": member.user.id.to_string() },
                "status": presence.status,
                "game": presence.activities.first(),
                "activities": presence.activities,
            }),
        );
    }
    Item::Member(value)
}

/// One of the five mutations the core ever emits against a client's virtual
/// list.
#[derive(Clone, Debug)]
pub enum Operation {
    Sync { range: (i64, i64), items: Vec<Item> },
    Invalidate { range: (i64, i64) },
    Insert { index: i64, item: Item },
    Update { index: i64, item: Item },
    Delete { index: i64 },
}

impl Operation {
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Sync { range, items } => json!({
                "op": "SYNC",
                "range": [range.0, range.1],
                "items": items.iter().map(Item::to_json).collect::<Vec<_>>(),
            }),
            Self::Invalidate { range } => json!({
                "op": "INVALIDATE",
                "range": [range.0, range.1],
            }),
            Self::Insert { index, item } => json!({
                "op": "INSERT",
                "index": index,
                "item": item.to_json(),
            }),
            Self::Update { index, item } => json!({
                "op": "UPDATE",
                "index": index,
                "item": item.to_json(),
            }),
            Self::Delete { index } => json!({
                "op": "DELETE",
                "index": index,
            }),
        }
    }
}

/// Builds the `GUILD_MEMBER_LIST_UPDATE` payload delivered to a session:
/// the list id (`"everyone"` for the guild-wide list), the guild id, the
/// non-empty groups' headers, and the op batch.
#[must_use]
pub fn build_payload(
    list_id: &str,
    guild_id: GuildId,
    group_counts: &[(GroupInfo, usize)],
    ops: &[Operation],
) -> Value {
    json!({
        "id": list_id,
        "guild_id": guild_id.to_string(),
        "groups": group_counts
            .iter()
            .filter(|(_, count)| *count > 0)
            .map(|(g, count)| json!({ "id": g.gid.to_string(), "count": count }))
            .collect::<Vec<_>>(),
        "ops": ops.iter().map(Operation::to_json).collect::<Vec<_>>(),
    })
}
