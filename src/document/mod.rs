//! Documents: a root, a logical clock and the queue of unsent local changes.

use std::collections::HashMap;

use tracing::{debug, error};

use crate::change::{Change, ChangeId, ChangePack, Checkpoint};
use crate::crdt::{ActorId, LogicalClock, Root};
use crate::error::Result;

pub mod context;

pub use context::ChangeContext;

/// A replica of one collaborative document.
///
/// Local edits go through [`Document::update`]; remote edits arrive as change
/// packs through [`Document::apply_change_pack`].
#[derive(Debug, Clone)]
pub struct Document {
    key: String,
    root: Root,
    clock: LogicalClock,
    client_seq: u32,
    checkpoint: Checkpoint,
    local_changes: Vec<Change>,
    /// Highest client sequence applied per remote actor.
    applied_seqs: HashMap<ActorId, u32>,
}

impl Document {
    /// Creates an empty document. The actor is assigned when attached.
    pub fn new(key: impl Into<String>) -> Self {
        Document {
            key: key.into(),
            root: Root::new(),
            clock: LogicalClock::new(ActorId::INITIAL),
            client_seq: 0,
            checkpoint: Checkpoint::INITIAL,
            local_changes: Vec::new(),
            applied_seqs: HashMap::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn root(&self) -> &Root {
        &self.root
    }

    pub fn checkpoint(&self) -> Checkpoint {
        self.checkpoint
    }

    pub fn actor(&self) -> ActorId {
        self.clock.actor()
    }

    /// Assigns the actor to the clock, to every pending local change and to
    /// every element created before the actor was known.
    pub fn set_actor(&mut self, actor: ActorId) {
        self.clock.set_actor(actor);
        self.root.set_actor(actor);
        for change in &mut self.local_changes {
            change.set_actor(actor);
        }
    }

    /// Returns true if there are local changes not yet acknowledged.
    pub fn has_local_changes(&self) -> bool {
        !self.local_changes.is_empty()
    }

    pub fn local_changes(&self) -> &[Change] {
        &self.local_changes
    }

    /// Runs `updater` as one local change.
    ///
    /// The closure works on a staged copy of the root; nothing is committed
    /// unless it returns `Ok`. A closure that records no operation creates
    /// no change.
    pub fn update<F>(&mut self, updater: F) -> Result<()>
    where
        F: FnOnce(&mut ChangeContext<'_>) -> Result<()>,
    {
        self.update_with_message(None, updater)
    }

    /// Like [`Document::update`], attaching a message to the change.
    pub fn update_with_message<F>(&mut self, message: Option<&str>, updater: F) -> Result<()>
    where
        F: FnOnce(&mut ChangeContext<'_>) -> Result<()>,
    {
        let mut staged_root = self.root.deepcopy();
        let mut staged_clock = self.clock;
        let lamport = staged_clock.next_change();

        let mut context = ChangeContext::new(&mut staged_root, &mut staged_clock);
        updater(&mut context)?;
        let operations = context.into_operations();
        if operations.is_empty() {
            return Ok(());
        }

        self.client_seq += 1;
        let id = ChangeId::new(self.client_seq, lamport, staged_clock.actor());
        debug!(
            "d:\"{}\" local change {} with {} ops",
            self.key,
            self.client_seq,
            operations.len()
        );
        self.local_changes
            .push(Change::new(id, message.map(str::to_owned), operations));
        self.root = staged_root;
        self.clock = staged_clock;
        Ok(())
    }

    /// Builds the pack of every pending local change.
    pub fn create_change_pack(&self) -> ChangePack {
        let checkpoint = self
            .checkpoint
            .increase_client_seq(self.local_changes.len() as u32);
        ChangePack::new(self.key.clone(), checkpoint, self.local_changes.clone())
    }

    /// Applies a pack received from the server.
    ///
    /// Each change is applied atomically. A change referencing an element this
    /// replica cannot resolve is logged and skipped; the replica stays up but
    /// diverges until a later pull repairs it.
    pub fn apply_change_pack(&mut self, pack: ChangePack) {
        for change in &pack.changes {
            self.apply_change(change);
        }

        self.local_changes
            .retain(|change| change.id.client_seq > pack.checkpoint.client_seq);
        self.checkpoint = self.checkpoint.forward(pack.checkpoint);

        if let Some(min_synced) = pack.min_synced_ticket {
            self.root.garbage_collect(&min_synced);
        }
    }

    /// Applies one remote change; returns false if it was discarded.
    ///
    /// Changes at or below the highest sequence already applied for their
    /// actor are redeliveries and are skipped.
    pub fn apply_change(&mut self, change: &Change) -> bool {
        let applied = self.applied_seqs.get(&change.id.actor).copied().unwrap_or(0);
        if change.id.client_seq <= applied {
            debug!(
                "d:\"{}\" skipping change {} from {}, already applied up to {}",
                self.key, change.id.client_seq, change.id.actor, applied
            );
            return false;
        }

        let mut staged = self.root.deepcopy();
        match change.execute(&mut staged) {
            Ok(()) => {
                self.root = staged;
                self.clock.observe(change.id.lamport);
                self.applied_seqs.insert(change.id.actor, change.id.client_seq);
                true
            }
            Err(e) => {
                error!(
                    "d:\"{}\" discarding change {}@{} from {}: {}",
                    self.key, change.id.client_seq, change.id.lamport, change.id.actor, e
                );
                false
            }
        }
    }

    /// Renders the visible content as a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        self.root.to_json()
    }

    /// Renders the visible content as a JSON string.
    pub fn marshal(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.root.to_json())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crdt::{ElementValue, TimeTicket};
    use crate::error::Error;
    use crate::operation::Operation;

    #[test]
    fn test_update_records_change() {
        let mut doc = Document::new("doc-1");
        doc.update(|ctx| {
            let root = ctx.root_created_at();
            ctx.set(root, "name", "crdt")?;
            Ok(())
        })
        .unwrap();

        assert!(doc.has_local_changes());
        assert_eq!(doc.local_changes()[0].id.client_seq, 1);
        assert_eq!(doc.marshal().unwrap(), r#"{"name":"crdt"}"#);
    }

    #[test]
    fn test_failed_update_leaves_no_trace() {
        let mut doc = Document::new("doc-1");
        let result = doc.update(|ctx| {
            let root = ctx.root_created_at();
            ctx.set(root, "kept", 1i64)?;
            // The root object is not an array
            ctx.push(root, 2i64)?;
            Ok(())
        });

        assert!(matches!(result, Err(Error::UnexpectedElementType { .. })));
        assert!(!doc.has_local_changes());
        assert_eq!(doc.to_json(), serde_json::json!({}));
    }

    #[test]
    fn test_empty_update_creates_no_change() {
        let mut doc = Document::new("doc-1");
        doc.update(|_| Ok(())).unwrap();
        assert!(!doc.has_local_changes());
        assert_eq!(doc.create_change_pack().checkpoint, Checkpoint::INITIAL);
    }

    #[test]
    fn test_acknowledged_changes_are_dropped() {
        let mut doc = Document::new("doc-1");
        for i in 0..3i64 {
            doc.update(|ctx| {
                let root = ctx.root_created_at();
                ctx.set(root, "n", i)?;
                Ok(())
            })
            .unwrap();
        }

        let pack = doc.create_change_pack();
        assert_eq!(pack.checkpoint, Checkpoint::new(3, 0));

        doc.apply_change_pack(ChangePack::new("doc-1", Checkpoint::new(2, 4), vec![]));
        assert_eq!(doc.local_changes().len(), 1);
        assert_eq!(doc.checkpoint(), Checkpoint::new(2, 4));
        assert_eq!(doc.create_change_pack().checkpoint, Checkpoint::new(3, 4));
    }

    #[test]
    fn test_set_actor_rewrites_pending_changes() {
        let mut doc = Document::new("doc-1");
        doc.update(|ctx| {
            let root = ctx.root_created_at();
            ctx.set(root, "list", ElementValue::Array)?;
            Ok(())
        })
        .unwrap();

        let actor = ActorId::from_bytes([9; 12]);
        doc.set_actor(actor);
        assert_eq!(doc.actor(), actor);
        assert_eq!(doc.local_changes()[0].id.actor, actor);
    }

    #[test]
    fn test_set_actor_claims_elements_made_before_attach() {
        let mut doc = Document::new("doc-1");
        let mut list = TimeTicket::INITIAL;
        doc.update(|ctx| {
            let root = ctx.root_created_at();
            list = ctx.set(root, "list", ElementValue::Array)?;
            ctx.push(list, 1i64)?;
            Ok(())
        })
        .unwrap();
        assert_eq!(list.actor, ActorId::INITIAL);

        let actor = ActorId::from_bytes([9; 12]);
        doc.set_actor(actor);

        let claimed = TimeTicket { actor, ..list };
        assert!(doc.root().find_by_created_at(&list).is_none());
        assert!(doc.root().array(&claimed).is_ok());
        let Operation::Add(add) = &doc.local_changes()[0].operations[1] else {
            panic!("expected an add");
        };
        assert_eq!(add.parent_created_at, claimed);
        assert_eq!(add.executed_at.actor, actor);

        // Later edits resolve the claimed tickets
        doc.update(|ctx| ctx.push(claimed, 2i64).map(|_| ())).unwrap();
        assert_eq!(doc.to_json(), serde_json::json!({ "list": [1, 2] }));
    }

    #[test]
    fn test_redelivered_change_is_skipped() {
        let mut source = Document::new("doc-1");
        source.set_actor(ActorId::from_bytes([2; 12]));
        source
            .update(|ctx| {
                let root = ctx.root_created_at();
                let n = ctx.set(root, "n", ElementValue::Counter(0))?;
                ctx.increment(n, 5)?;
                Ok(())
            })
            .unwrap();
        let change = source.local_changes()[0].clone();

        let mut doc = Document::new("doc-1");
        doc.set_actor(ActorId::from_bytes([3; 12]));
        assert!(doc.apply_change(&change));
        assert!(!doc.apply_change(&change));
        assert_eq!(doc.to_json(), serde_json::json!({ "n": 5 }));
    }
}
