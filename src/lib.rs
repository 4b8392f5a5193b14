//! A lazy, range-subscribed member list engine.
//!
//! Maintains, per channel, an ordered and grouped view of a guild's members
//! (hoisted roles plus synthetic `online`/`offline` groups) and emits a
//! stream of incremental `SYNC`/`INSERT`/`UPDATE`/`DELETE`/`INVALIDATE`
//! operations to sessions that have subscribed to specific index ranges of
//! that view. Lists are materialized lazily, on first subscription, and
//! torn down once their last subscriber leaves.
//!
//! The crate has no opinion on transport, persistence, or authentication:
//! it depends on its callers only through the [`collab`] traits (`Storage`,
//! `PresenceStore`, `SessionRegistry`), which a gateway/HTTP layer
//! implements against its own database and websocket connections.
#![deny(rust_2018_idioms)]
#![deny(clippy::unwrap_used, clippy::non_ascii_literal, clippy::let_underscore_must_use)]

pub mod collab;
pub mod constants;
pub mod dispatcher;
pub mod error;
pub mod list;
pub mod model;

pub use dispatcher::LazyGuildDispatcher;
pub use error::{Error, Result};
pub use list::{MemberList, Settings};
