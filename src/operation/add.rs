//! Insertion of a new element into an array.

use serde::{Deserialize, Serialize};

use crate::crdt::{ElementNode, ElementValue, Root, TimeTicket};
use crate::error::{Error, Result};

/// Inserts a new element, created at `executed_at`, after `prev_created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddOperation {
    pub parent_created_at: TimeTicket,
    pub prev_created_at: TimeTicket,
    pub value: ElementValue,
    pub executed_at: TimeTicket,
}

impl AddOperation {
    pub fn new(
        parent_created_at: TimeTicket,
        prev_created_at: TimeTicket,
        value: ElementValue,
        executed_at: TimeTicket,
    ) -> Self {
        AddOperation {
            parent_created_at,
            prev_created_at,
            value,
            executed_at,
        }
    }

    pub fn execute(&self, root: &mut Root) -> Result<()> {
        let array = root.array(&self.parent_created_at)?;
        if let Some(existing) = root.find_by_created_at(&self.executed_at) {
            let redelivered = existing.parent == Some(self.parent_created_at)
                && array.contains(&self.executed_at);
            return if redelivered {
                Ok(())
            } else {
                Err(Error::DuplicateTicket(self.executed_at))
            };
        }

        root.array_mut(&self.parent_created_at)?
            .insert_after(&self.prev_created_at, self.executed_at)?;
        root.register_element(ElementNode::new(
            self.executed_at,
            Some(self.parent_created_at),
            self.value.clone().into_element(self.executed_at),
        ))
    }
}
