//! Counter increments.

use serde::{Deserialize, Serialize};

use crate::crdt::{Root, TimeTicket};
use crate::error::Result;

/// Adds `delta` to a counter. Increments commute, so no ticket comparison is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncrementOperation {
    pub parent_created_at: TimeTicket,
    pub delta: i64,
    pub executed_at: TimeTicket,
}

impl IncrementOperation {
    pub fn new(parent_created_at: TimeTicket, delta: i64, executed_at: TimeTicket) -> Self {
        IncrementOperation {
            parent_created_at,
            delta,
            executed_at,
        }
    }

    pub fn execute(&self, root: &mut Root) -> Result<()> {
        let counter = root.counter_mut(&self.parent_created_at)?;
        counter.value = counter.value.wrapping_add(self.delta);
        Ok(())
    }
}
