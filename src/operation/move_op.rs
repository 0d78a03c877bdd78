//! Repositioning of an element inside an array.

use serde::{Deserialize, Serialize};

use crate::crdt::{Root, TimeTicket};
use crate::error::Result;

/// Moves an array element right after another one.
///
/// Concurrent moves of the same element commute: only the move with the
/// greatest `executed_at` ever decides the final position, and redelivering a
/// move that already won changes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOperation {
    pub parent_created_at: TimeTicket,
    /// Anchor to reinsert after; [`TimeTicket::INITIAL`] moves to the front
    pub prev_created_at: TimeTicket,
    /// The element being moved
    pub created_at: TimeTicket,
    pub executed_at: TimeTicket,
}

impl MoveOperation {
    pub fn new(
        parent_created_at: TimeTicket,
        prev_created_at: TimeTicket,
        created_at: TimeTicket,
        executed_at: TimeTicket,
    ) -> Self {
        MoveOperation {
            parent_created_at,
            prev_created_at,
            created_at,
            executed_at,
        }
    }

    pub fn execute(&self, root: &mut Root) -> Result<()> {
        let array = root.array_mut(&self.parent_created_at)?;
        array.move_after(&self.prev_created_at, &self.created_at, self.executed_at)?;
        Ok(())
    }
}
