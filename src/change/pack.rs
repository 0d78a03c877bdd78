//! Change packs exchanged during attach, detach and push-pull.

use serde::{Deserialize, Serialize};

use crate::change::{Change, Checkpoint};
use crate::crdt::TimeTicket;

/// An ordered batch of changes for one document plus the sender's checkpoint.
///
/// Changes are applied strictly in the order they appear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangePack {
    pub document_key: String,
    pub checkpoint: Checkpoint,
    #[serde(default)]
    pub changes: Vec<Change>,
    /// Tombstones removed at or before this ticket have been observed by
    /// every replica and may be purged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_synced_ticket: Option<TimeTicket>,
}

impl ChangePack {
    pub fn new(document_key: impl Into<String>, checkpoint: Checkpoint, changes: Vec<Change>) -> Self {
        ChangePack {
            document_key: document_key.into(),
            checkpoint,
            changes,
            min_synced_ticket: None,
        }
    }

    /// Sets the garbage collection watermark.
    pub fn with_min_synced_ticket(mut self, ticket: TimeTicket) -> Self {
        self.min_synced_ticket = Some(ticket);
        self
    }

    /// Number of changes in the pack.
    pub fn change_size(&self) -> usize {
        self.changes.len()
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangeId;
    use crate::crdt::{ActorId, ElementValue};
    use crate::operation::{Operation, SetOperation};

    #[test]
    fn test_pack_json_shape() {
        let actor = ActorId::from_bytes([0xa1; 12]);
        let op = SetOperation::new(
            TimeTicket::INITIAL,
            "k",
            ElementValue::from(1i64),
            TimeTicket::new(1, 1, actor),
        );
        let change = Change::new(ChangeId::new(1, 1, actor), None, vec![Operation::from(op)]);
        let pack = ChangePack::new("doc", Checkpoint::new(1, 0), vec![change]);

        let json = serde_json::to_value(&pack).unwrap();
        assert_eq!(json["document_key"], "doc");
        assert_eq!(json["changes"][0]["operations"][0]["op"], "set");
        assert!(json.get("min_synced_ticket").is_none());

        let back: ChangePack = serde_json::from_value(json).unwrap();
        assert_eq!(back, pack);
        assert_eq!(back.change_size(), 1);
    }
}
