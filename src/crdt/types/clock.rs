//! Logical clock implementation for generating time tickets.
//!
//! This module contains the LogicalClock struct which hands out time tickets
//! for local changes and advances past every lamport value seen from peers.

use crate::crdt::types::actor::ActorId;
use crate::crdt::types::ticket::TimeTicket;

/// A hybrid lamport clock owned by one document replica.
///
/// Every local change advances the lamport value once; each ticket issued
/// within that change shares the lamport and gets the next delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalClock {
    lamport: u64,
    delimiter: u32,
    actor: ActorId,
}

impl LogicalClock {
    /// Creates a new clock for the given actor.
    pub fn new(actor: ActorId) -> Self {
        LogicalClock {
            lamport: 0,
            delimiter: 0,
            actor,
        }
    }

    /// Starts a new change and returns its lamport value.
    pub fn next_change(&mut self) -> u64 {
        self.lamport += 1;
        self.delimiter = 0;
        self.lamport
    }

    /// Issues the next ticket within the current change.
    pub fn issue(&mut self) -> TimeTicket {
        self.delimiter += 1;
        TimeTicket::new(self.lamport, self.delimiter, self.actor)
    }

    /// Starts a new change and issues its first ticket.
    pub fn tick(&mut self) -> TimeTicket {
        self.next_change();
        self.issue()
    }

    /// Advances past a lamport value observed from a peer.
    pub fn observe(&mut self, remote_lamport: u64) {
        self.lamport = self.lamport.max(remote_lamport) + 1;
        self.delimiter = 0;
    }

    /// Gets the current lamport value.
    pub fn lamport(&self) -> u64 {
        self.lamport
    }

    /// Gets the actor id.
    pub fn actor(&self) -> ActorId {
        self.actor
    }

    /// Reassigns the actor, used when a document is attached to a client.
    pub fn set_actor(&mut self, actor: ActorId) {
        self.actor = actor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(byte: u8) -> ActorId {
        ActorId::from_bytes([byte; 12])
    }

    #[test]
    fn test_logical_clock() {
        let mut clock = LogicalClock::new(actor(1));

        let ts1 = clock.tick();
        let ts2 = clock.tick();

        assert_eq!(ts1.actor, actor(1));
        assert!(ts1 < ts2);
        assert_eq!(ts1.lamport + 1, ts2.lamport);
    }

    #[test]
    fn test_logical_clock_observe() {
        let mut clock = LogicalClock::new(actor(1));

        // Simulate receiving a ticket from the future
        clock.observe(100);
        let next = clock.tick();

        assert!(next.lamport > 100);
        assert_eq!(next.actor, actor(1));
    }

    #[test]
    fn test_observe_never_goes_backwards() {
        let mut clock = LogicalClock::new(actor(1));
        clock.observe(10);
        let before = clock.lamport();
        clock.observe(3);
        assert!(clock.lamport() > before);
    }

    #[test]
    fn test_delimiters_within_change() {
        let mut clock = LogicalClock::new(actor(5));
        let lamport = clock.next_change();

        let ts1 = clock.issue();
        let ts2 = clock.issue();

        assert_eq!(ts1.lamport, lamport);
        assert_eq!(ts2.lamport, lamport);
        assert_eq!(ts1.delimiter, 1);
        assert_eq!(ts1.delimiter + 1, ts2.delimiter);
        assert!(ts1 < ts2);
    }
}
