//! Removal of an element from its container.

use serde::{Deserialize, Serialize};

use crate::crdt::{Root, TimeTicket};
use crate::error::{Error, Result};

/// Tombstones `created_at`. Among concurrent removals the latest one is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveOperation {
    pub parent_created_at: TimeTicket,
    pub created_at: TimeTicket,
    pub executed_at: TimeTicket,
}

impl RemoveOperation {
    pub fn new(parent_created_at: TimeTicket, created_at: TimeTicket, executed_at: TimeTicket) -> Self {
        RemoveOperation {
            parent_created_at,
            created_at,
            executed_at,
        }
    }

    pub fn execute(&self, root: &mut Root) -> Result<()> {
        let parent = root
            .find_by_created_at(&self.parent_created_at)
            .ok_or(Error::ElementNotFound(self.parent_created_at))?;
        if !parent.element.is_container() {
            return Err(Error::UnexpectedElementType {
                ticket: self.parent_created_at,
                expected: "container",
            });
        }

        let target = root
            .find_by_created_at(&self.created_at)
            .ok_or(Error::ElementNotFound(self.created_at))?;
        if target.parent != Some(self.parent_created_at) {
            return Err(Error::ElementNotFound(self.created_at));
        }

        root.tombstone(&self.created_at, self.executed_at)?;
        Ok(())
    }
}
