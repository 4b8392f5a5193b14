//! The crate's error type.
//!
//! Mirrors the teacher library's own `error.rs`: a plain enum with a
//! hand-written [`Display`] and [`std::error::Error`] impl rather than a
//! derive-macro crate, since that is the only error-handling style the
//! teacher itself uses.

use std::fmt::{self, Display, Formatter};

/// The common result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the lazy member list engine.
///
/// Most failure modes described by the specification (absent member, unknown
/// role, stale group) are deliberately *not* represented here: they are
/// logged with `tracing::warn!` and swallowed, since the engine must keep
/// serving the sessions it can rather than abort a whole handler invocation
/// over one inconsistent entry. `Error` is reserved for failures that leave
/// the caller unable to make progress at all.
#[derive(Debug)]
pub enum Error {
    /// A storage, presence, or session-registry collaborator call failed.
    /// The member list is left uninitialized so a later call can retry.
    Collaborator(String),
    /// A guild or channel referenced by a handler call has no known mapping
    /// (e.g. `guild_from_channel` returned nothing and no fallback applies).
    UnknownEntity(&'static str),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collaborator(msg) => write!(f, "collaborator call failed: {msg}"),
            Self::UnknownEntity(what) => write!(f, "unknown {what}"),
        }
    }
}

impl std::error::Error for Error {}
