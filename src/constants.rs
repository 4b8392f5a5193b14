//! A set of constants used by the engine.

/// The maximum number of hoisted role groups a channel list will track.
/// `online` and `offline` are pinned just past this range, at
/// `MAX_ROLES + 1` and `MAX_ROLES + 2`.
pub const MAX_ROLES: i64 = 250;
