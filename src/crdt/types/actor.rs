//! Replica identifier type and related functionality.
//!
//! This module contains the definition of ActorId, which uniquely identifies
//! each participant in the distributed CRDT system.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// Number of bytes in an actor id.
pub const ACTOR_ID_LEN: usize = 12;

/// A unique identifier for each replica (collaborator) in the distributed system.
///
/// Actor ids are assigned by the server when a client activates and never change
/// for the lifetime of that client. Ordering is unsigned lexicographic over the
/// raw bytes and is only ever used as the last tie-break between tickets.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ActorId([u8; ACTOR_ID_LEN]);

impl ActorId {
    /// The actor used by documents that have not been attached yet.
    pub const INITIAL: ActorId = ActorId([0x00; ACTOR_ID_LEN]);

    /// The largest possible actor, used by the `MAX` sentinel ticket.
    pub const MAX: ActorId = ActorId([0xff; ACTOR_ID_LEN]);

    /// Creates an actor id from raw bytes.
    pub const fn from_bytes(bytes: [u8; ACTOR_ID_LEN]) -> Self {
        ActorId(bytes)
    }

    /// Parses an actor id from its hex representation.
    pub fn from_hex(value: &str) -> Result<Self, Error> {
        let bytes = hex::decode(value).map_err(|e| Error::InvalidActorId(e.to_string()))?;
        let bytes: [u8; ACTOR_ID_LEN] = bytes.try_into().map_err(|raw: Vec<u8>| {
            Error::InvalidActorId(format!(
                "expected {ACTOR_ID_LEN} bytes, got {}",
                raw.len()
            ))
        })?;
        Ok(ActorId(bytes))
    }

    /// Returns the lowercase hex representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8; ACTOR_ID_LEN] {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorId({})", self.to_hex())
    }
}

impl FromStr for ActorId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActorId::from_hex(s)
    }
}

impl Serialize for ActorId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ActorId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        ActorId::from_hex(&value).map_err(serde::de::Error::custom)
    }
}
