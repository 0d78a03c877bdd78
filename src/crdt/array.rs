//! Replicated growable array used by the `Array` element.
//!
//! The array keeps every child it has ever held, tombstones included, in one
//! ordered list. [`TimeTicket::INITIAL`] acts as the head sentinel: inserting
//! after it places an element at the front.

use crate::crdt::types::{ActorId, TimeTicket};
use crate::error::{Error, Result};

/// One slot of the array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayEntry {
    /// Identity of the child element
    pub created_at: TimeTicket,
    /// Ticket of the last move that won for this element
    pub moved_at: Option<TimeTicket>,
}

impl ArrayEntry {
    /// The ticket that decides where this entry sits relative to concurrent inserts.
    pub fn positioned_at(&self) -> TimeTicket {
        self.moved_at.unwrap_or(self.created_at)
    }
}

/// Ordered children of an array element.
///
/// # Design
///
/// - Concurrent inserts after the same anchor are ordered by descending
///   `positioned_at`, so every replica lands on the same sequence
/// - A move only wins if it is later than the element's current `moved_at`
/// - Removal is recorded on the element itself; the slot stays in place
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayElement {
    entries: Vec<ArrayEntry>,
}

impl ArrayElement {
    /// Creates an empty array.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots, tombstones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Children in order, tombstones included.
    pub fn tickets(&self) -> impl Iterator<Item = TimeTicket> + '_ {
        self.entries.iter().map(|entry| entry.created_at)
    }

    /// Returns the slot holding `created_at`.
    pub fn entry(&self, created_at: &TimeTicket) -> Option<&ArrayEntry> {
        self.entries.iter().find(|e| e.created_at == *created_at)
    }

    /// Returns true if `created_at` has a slot in this array.
    pub fn contains(&self, created_at: &TimeTicket) -> bool {
        self.entry(created_at).is_some()
    }

    fn index_of(&self, created_at: &TimeTicket) -> Option<usize> {
        self.entries.iter().position(|e| e.created_at == *created_at)
    }

    /// Finds the slot right after which an element positioned at
    /// `executed_at` belongs, starting from the anchor `prev_created_at`.
    ///
    /// Neighbours positioned later than `executed_at` were placed concurrently
    /// by a later operation and stay in front.
    fn insertion_index(&self, prev_created_at: &TimeTicket, executed_at: &TimeTicket) -> Result<usize> {
        let mut index = if *prev_created_at == TimeTicket::INITIAL {
            0
        } else {
            self.index_of(prev_created_at)
                .ok_or(Error::ElementNotFound(*prev_created_at))?
                + 1
        };

        while let Some(next) = self.entries.get(index) {
            if !next.positioned_at().after(executed_at) {
                break;
            }
            index += 1;
        }
        Ok(index)
    }

    /// Inserts `created_at` after the element identified by `prev_created_at`.
    pub fn insert_after(&mut self, prev_created_at: &TimeTicket, created_at: TimeTicket) -> Result<()> {
        let index = self.insertion_index(prev_created_at, &created_at)?;
        self.entries.insert(
            index,
            ArrayEntry {
                created_at,
                moved_at: None,
            },
        );
        Ok(())
    }

    /// Moves `created_at` right after `prev_created_at` if `executed_at` is
    /// later than the element's last winning move.
    ///
    /// Returns true if the element moved, false if the move was stale.
    pub fn move_after(
        &mut self,
        prev_created_at: &TimeTicket,
        created_at: &TimeTicket,
        executed_at: TimeTicket,
    ) -> Result<bool> {
        let index = self
            .index_of(created_at)
            .ok_or(Error::ElementNotFound(*created_at))?;
        if *prev_created_at != TimeTicket::INITIAL && !self.contains(prev_created_at) {
            return Err(Error::ElementNotFound(*prev_created_at));
        }
        if prev_created_at == created_at {
            return Ok(false);
        }

        let entry = self.entries[index];
        if let Some(moved_at) = entry.moved_at {
            if !executed_at.after(&moved_at) {
                return Ok(false);
            }
        }

        self.entries.remove(index);
        let target = self.insertion_index(prev_created_at, &executed_at)?;
        self.entries.insert(
            target,
            ArrayEntry {
                created_at: entry.created_at,
                moved_at: Some(executed_at),
            },
        );
        Ok(true)
    }

    pub(crate) fn set_actor(&mut self, actor: ActorId) {
        for entry in &mut self.entries {
            entry.created_at = entry.created_at.claimed_by(actor);
            entry.moved_at = entry.moved_at.map(|t| t.claimed_by(actor));
        }
    }

    /// Drops the slot of a purged element.
    pub(crate) fn purge(&mut self, created_at: &TimeTicket) {
        self.entries.retain(|e| e.created_at != *created_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(lamport: u64, actor: u8) -> TimeTicket {
        TimeTicket::new(lamport, 0, ActorId::from_bytes([actor; 12]))
    }

    fn order(array: &ArrayElement) -> Vec<u64> {
        array.tickets().map(|t| t.lamport).collect()
    }

    #[test]
    fn test_basic_insertion() {
        let mut array = ArrayElement::new();
        array.insert_after(&TimeTicket::INITIAL, ticket(1, 1)).unwrap();
        array.insert_after(&ticket(1, 1), ticket(2, 1)).unwrap();
        array.insert_after(&ticket(2, 1), ticket(3, 1)).unwrap();

        assert_eq!(order(&array), vec![1, 2, 3]);
        assert_eq!(array.len(), 3);
    }

    #[test]
    fn test_concurrent_inserts_at_same_anchor() {
        // Replica 1 applies its own insert first, replica 2 the other way round
        let mut a = ArrayElement::new();
        a.insert_after(&TimeTicket::INITIAL, ticket(1, 1)).unwrap();
        a.insert_after(&TimeTicket::INITIAL, ticket(1, 2)).unwrap();

        let mut b = ArrayElement::new();
        b.insert_after(&TimeTicket::INITIAL, ticket(1, 2)).unwrap();
        b.insert_after(&TimeTicket::INITIAL, ticket(1, 1)).unwrap();

        assert_eq!(a, b);
        // The later ticket sits closer to the anchor
        assert_eq!(a.tickets().next(), Some(ticket(1, 2)));
    }

    #[test]
    fn test_insert_after_unknown_anchor() {
        let mut array = ArrayElement::new();
        let result = array.insert_after(&ticket(9, 9), ticket(1, 1));
        assert!(matches!(result, Err(Error::ElementNotFound(_))));
    }

    #[test]
    fn test_move_to_front() {
        let mut array = ArrayElement::new();
        array.insert_after(&TimeTicket::INITIAL, ticket(1, 1)).unwrap();
        array.insert_after(&ticket(1, 1), ticket(2, 1)).unwrap();

        assert!(array.move_after(&TimeTicket::INITIAL, &ticket(2, 1), ticket(3, 1)).unwrap());
        assert_eq!(order(&array), vec![2, 1]);
        assert_eq!(array.entry(&ticket(2, 1)).unwrap().moved_at, Some(ticket(3, 1)));
    }

    #[test]
    fn test_stale_move_is_discarded() {
        let mut array = ArrayElement::new();
        array.insert_after(&TimeTicket::INITIAL, ticket(1, 1)).unwrap();
        array.insert_after(&ticket(1, 1), ticket(2, 1)).unwrap();

        assert!(array.move_after(&TimeTicket::INITIAL, &ticket(2, 1), ticket(7, 2)).unwrap());
        assert!(!array.move_after(&ticket(1, 1), &ticket(2, 1), ticket(5, 3)).unwrap());
        assert_eq!(order(&array), vec![2, 1]);

        // Redelivery of the winning move changes nothing
        assert!(!array.move_after(&TimeTicket::INITIAL, &ticket(2, 1), ticket(7, 2)).unwrap());
        assert_eq!(order(&array), vec![2, 1]);
    }

    #[test]
    fn test_move_after_itself_is_noop() {
        let mut array = ArrayElement::new();
        array.insert_after(&TimeTicket::INITIAL, ticket(1, 1)).unwrap();
        assert!(!array.move_after(&ticket(1, 1), &ticket(1, 1), ticket(2, 1)).unwrap());
        assert_eq!(array.entry(&ticket(1, 1)).unwrap().moved_at, None);
    }
}
