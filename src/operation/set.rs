//! Assignment of a value to an object key.

use serde::{Deserialize, Serialize};

use crate::crdt::{ElementNode, ElementValue, Root, TimeTicket};
use crate::error::{Error, Result};

/// Sets `key` of an object to a new element created at `executed_at`.
///
/// The value with the greatest creation ticket owns the key. The loser, old or
/// new, is tombstoned at the winner's creation ticket so every replica
/// records the same tombstone regardless of delivery order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetOperation {
    pub parent_created_at: TimeTicket,
    pub key: String,
    pub value: ElementValue,
    pub executed_at: TimeTicket,
}

impl SetOperation {
    pub fn new(
        parent_created_at: TimeTicket,
        key: impl Into<String>,
        value: ElementValue,
        executed_at: TimeTicket,
    ) -> Self {
        SetOperation {
            parent_created_at,
            key: key.into(),
            value,
            executed_at,
        }
    }

    pub fn execute(&self, root: &mut Root) -> Result<()> {
        let object = root.object(&self.parent_created_at)?;
        if let Some(existing) = root.find_by_created_at(&self.executed_at) {
            let redelivered = existing.parent == Some(self.parent_created_at)
                && object.key_of(&self.executed_at) == Some(self.key.as_str());
            return if redelivered {
                Ok(())
            } else {
                Err(Error::DuplicateTicket(self.executed_at))
            };
        }

        root.register_element(ElementNode::new(
            self.executed_at,
            Some(self.parent_created_at),
            self.value.clone().into_element(self.executed_at),
        ))?;
        let previous = root
            .object_mut(&self.parent_created_at)?
            .insert(self.key.clone(), self.executed_at);

        if let Some(previous) = previous {
            let (loser, winner) = if self.executed_at.after(&previous) {
                (previous, self.executed_at)
            } else {
                (self.executed_at, previous)
            };
            root.tombstone(&loser, winner)?;
        }
        Ok(())
    }
}
