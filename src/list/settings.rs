//! Tunables for the lazy member list engine, mirroring the teacher's
//! `cache::Settings`: a plain struct with public fields and a `Default` impl,
//! assembled by field assignment rather than a builder.

use crate::constants::MAX_ROLES;

/// Configuration consulted by [`crate::list::MemberList`] and
/// [`crate::dispatcher::LazyGuildDispatcher`].
#[derive(Clone, Debug)]
pub struct Settings {
    /// The maximum number of hoisted-role groups a single channel list will
    /// track. Mirrors [`MAX_ROLES`]; kept as a runtime setting, not just the
    /// constant, so embedding applications can lower it for smaller guild
    /// shards.
    pub max_roles: i64,
    /// When `true`, [`crate::list::MemberList::pres_update`] dispatches the
    /// index-precise `INSERT`/`DELETE` op pair it computes for a complex
    /// presence change directly, instead of discarding it and resyncing.
    /// Experimental and unvalidated against concurrent client state; the
    /// engine defaults to the safer resync path.
    pub precise_complex_ops: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self { max_roles: MAX_ROLES, precise_complex_ops: false }
    }
}
