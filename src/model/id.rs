//! A collection of newtypes defining type-strong snowflake-style ids.
//!
//! Every id is a thin `u64` wrapper. Display and JSON serialization render the
//! inner value as a string, matching the wire shapes in [`crate::list::op`].

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

macro_rules! id_u64 {
    ($(#[$attr:meta] $name:ident;)*) => {
        $(
            #[$attr]
            #[derive(Copy, Clone, Default, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
            pub struct $name(pub u64);

            impl $name {
                #[must_use]
                pub const fn new(id: u64) -> Self {
                    Self(id)
                }

                #[must_use]
                pub const fn get(self) -> u64 {
                    self.0
                }
            }

            impl From<u64> for $name {
                fn from(id: u64) -> Self {
                    Self(id)
                }
            }

            impl Display for $name {
                fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                    Display::fmt(&self.0, f)
                }
            }

            impl Serialize for $name {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.collect_str(&self.0)
                }
            }

            impl<'de> Deserialize<'de> for $name {
                fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                    struct IdVisitor;

                    impl serde::de::Visitor<'_> for IdVisitor {
                        type Value = $name;

                        fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
                            f.write_str("a snowflake id as a string or integer")
                        }

                        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Self::Value, E> {
                            Ok($name(v))
                        }

                        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                            v.parse().map($name).map_err(E::custom)
                        }
                    }

                    deserializer.deserialize_any(IdVisitor)
                }
            }
        )*
    }
}

id_u64! {
    /// An identifier for a guild.
    GuildId;
    /// An identifier for a channel.
    ChannelId;
    /// An identifier for a role.
    RoleId;
    /// An identifier for a user (and, 1:1, the member sharing that user's account).
    UserId;
}

/// An identifier for a gateway session. Sessions are opaque strings on the wire
/// (unlike the other snowflake ids), mirroring how the collaborator session
/// registry names its connections.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
