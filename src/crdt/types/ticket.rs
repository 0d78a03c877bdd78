//! Time ticket implementation for causal ordering in distributed systems.
//!
//! This module contains the TimeTicket struct which provides a total ordering
//! of every element creation and every operation effect across replicas.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::crdt::types::actor::ActorId;

/// A logical timestamp naming one element or one operation effect.
///
/// A ticket combines the lamport value of the change that issued it, a
/// delimiter that distinguishes tickets issued within the same change, and the
/// issuing actor. Two distinct tickets are always comparable.
///
/// # Ordering
///
/// Tickets are ordered first by lamport, then by delimiter, then by actor.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeTicket {
    /// The lamport value of the change that issued this ticket
    pub lamport: u64,
    /// Position of this ticket among those issued by the same change
    pub delimiter: u32,
    /// The replica that issued this ticket
    pub actor: ActorId,
}

impl TimeTicket {
    /// Anchor for the head of every array and creation ticket of the root object.
    pub const INITIAL: TimeTicket = TimeTicket {
        lamport: 0,
        delimiter: 0,
        actor: ActorId::INITIAL,
    };

    /// Larger than any ticket a replica can issue.
    pub const MAX: TimeTicket = TimeTicket {
        lamport: u64::MAX,
        delimiter: u32::MAX,
        actor: ActorId::MAX,
    };

    /// Creates a new ticket.
    pub const fn new(lamport: u64, delimiter: u32, actor: ActorId) -> Self {
        TimeTicket {
            lamport,
            delimiter,
            actor,
        }
    }

    /// Returns true if this ticket is strictly later than `other`.
    pub fn after(&self, other: &TimeTicket) -> bool {
        self > other
    }

    /// Reassigns a ticket issued before its replica knew its actor.
    ///
    /// Tickets of other actors and the `INITIAL` sentinel are returned as is.
    pub fn claimed_by(self, actor: ActorId) -> TimeTicket {
        if self.actor == ActorId::INITIAL && self != TimeTicket::INITIAL {
            TimeTicket { actor, ..self }
        } else {
            self
        }
    }

    /// Short form used in log lines, e.g. `12:3:a1b2`.
    pub fn structure(&self) -> String {
        let hex = self.actor.to_hex();
        format!(
            "{}:{}:{}",
            self.lamport,
            self.delimiter,
            &hex[hex.len() - 4..]
        )
    }
}

impl PartialOrd for TimeTicket {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeTicket {
    fn cmp(&self, other: &Self) -> Ordering {
        self.lamport
            .cmp(&other.lamport)
            .then_with(|| self.delimiter.cmp(&other.delimiter))
            .then_with(|| self.actor.cmp(&other.actor))
    }
}

impl fmt::Display for TimeTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.lamport, self.delimiter, self.actor)
    }
}

impl fmt::Debug for TimeTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimeTicket({})", self.structure())
    }
}
