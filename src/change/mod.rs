//! Changes and change packs: the unit of exchange between replicas.

use serde::{Deserialize, Serialize};

use crate::crdt::{ActorId, Root};
use crate::error::Result;
use crate::operation::Operation;

pub mod checkpoint;
pub mod pack;

pub use checkpoint::Checkpoint;
pub use pack::ChangePack;

/// Identifies one change: its position in the issuing client's sequence, its
/// lamport value, and the issuing actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeId {
    pub client_seq: u32,
    pub lamport: u64,
    pub actor: ActorId,
}

impl ChangeId {
    pub fn new(client_seq: u32, lamport: u64, actor: ActorId) -> Self {
        ChangeId {
            client_seq,
            lamport,
            actor,
        }
    }
}

/// A batch of operations made by one actor in one local update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub id: ChangeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub operations: Vec<Operation>,
}

impl Change {
    pub fn new(id: ChangeId, message: Option<String>, operations: Vec<Operation>) -> Self {
        Change {
            id,
            message,
            operations,
        }
    }

    /// Executes every operation in order against `root`.
    ///
    /// Stops at the first failing operation; callers stage `root` so a
    /// failure leaves no partial change behind.
    pub fn execute(&self, root: &mut Root) -> Result<()> {
        for operation in &self.operations {
            operation.execute(root)?;
        }
        Ok(())
    }

    /// Reassigns the issuing actor, used when a document gets attached.
    ///
    /// Operation tickets issued before the actor was known move with it.
    pub fn set_actor(&mut self, actor: ActorId) {
        self.id.actor = actor;
        for operation in &mut self.operations {
            operation.set_actor(actor);
        }
    }
}
