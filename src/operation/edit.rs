//! Replacement of a text element's content.

use serde::{Deserialize, Serialize};

use crate::crdt::{Root, TimeTicket};
use crate::error::Result;

/// Replaces the whole content of a text element; the latest edit wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditOperation {
    pub parent_created_at: TimeTicket,
    pub content: String,
    pub executed_at: TimeTicket,
}

impl EditOperation {
    pub fn new(parent_created_at: TimeTicket, content: impl Into<String>, executed_at: TimeTicket) -> Self {
        EditOperation {
            parent_created_at,
            content: content.into(),
            executed_at,
        }
    }

    pub fn execute(&self, root: &mut Root) -> Result<()> {
        let text = root.text_mut(&self.parent_created_at)?;
        if self.executed_at.after(&text.updated_at) {
            text.content.clone_from(&self.content);
            text.updated_at = self.executed_at;
        }
        Ok(())
    }
}
