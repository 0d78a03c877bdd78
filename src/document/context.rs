//! Change context handed to local update closures.

use crate::crdt::{ElementValue, LogicalClock, Root, TimeTicket};
use crate::error::{Error, Result};
use crate::operation::{
    AddOperation, EditOperation, IncrementOperation, MoveOperation, Operation, RemoveOperation,
    SetOperation,
};

/// Issues tickets and records the operations of one local change.
///
/// Every helper executes its operation immediately against the staged root,
/// so later calls in the same closure see earlier effects.
pub struct ChangeContext<'a> {
    root: &'a mut Root,
    clock: &'a mut LogicalClock,
    operations: Vec<Operation>,
}

impl<'a> ChangeContext<'a> {
    pub(crate) fn new(root: &'a mut Root, clock: &'a mut LogicalClock) -> Self {
        ChangeContext {
            root,
            clock,
            operations: Vec::new(),
        }
    }

    /// Read access to the staged root.
    pub fn root(&self) -> &Root {
        &*self.root
    }

    /// Creation ticket of the top-level object.
    pub fn root_created_at(&self) -> TimeTicket {
        self.root.root_created_at()
    }

    fn record(&mut self, operation: Operation) -> Result<()> {
        operation.execute(self.root)?;
        self.operations.push(operation);
        Ok(())
    }

    /// Sets `key` of the object `parent` and returns the new element's ticket.
    pub fn set(
        &mut self,
        parent: TimeTicket,
        key: &str,
        value: impl Into<ElementValue>,
    ) -> Result<TimeTicket> {
        let ticket = self.clock.issue();
        self.record(SetOperation::new(parent, key, value.into(), ticket).into())?;
        Ok(ticket)
    }

    /// Inserts a value after `prev` in the array `parent`.
    pub fn insert_after(
        &mut self,
        parent: TimeTicket,
        prev: TimeTicket,
        value: impl Into<ElementValue>,
    ) -> Result<TimeTicket> {
        let ticket = self.clock.issue();
        self.record(AddOperation::new(parent, prev, value.into(), ticket).into())?;
        Ok(ticket)
    }

    /// Appends a value to the array `parent`.
    pub fn push(&mut self, parent: TimeTicket, value: impl Into<ElementValue>) -> Result<TimeTicket> {
        let last = self
            .root
            .array(&parent)?
            .tickets()
            .last()
            .unwrap_or(TimeTicket::INITIAL);
        self.insert_after(parent, last, value)
    }

    /// Moves `created_at` right after `prev` within the array `parent`.
    pub fn move_after(&mut self, parent: TimeTicket, prev: TimeTicket, created_at: TimeTicket) -> Result<()> {
        let ticket = self.clock.issue();
        self.record(MoveOperation::new(parent, prev, created_at, ticket).into())
    }

    /// Moves `created_at` to the front of the array `parent`.
    pub fn move_front(&mut self, parent: TimeTicket, created_at: TimeTicket) -> Result<()> {
        self.move_after(parent, TimeTicket::INITIAL, created_at)
    }

    /// Removes `created_at` from the container `parent`.
    pub fn remove(&mut self, parent: TimeTicket, created_at: TimeTicket) -> Result<()> {
        let ticket = self.clock.issue();
        self.record(RemoveOperation::new(parent, created_at, ticket).into())
    }

    /// Removes whatever currently owns `key` in the object `parent`.
    pub fn remove_key(&mut self, parent: TimeTicket, key: &str) -> Result<()> {
        let created_at = self
            .root
            .object(&parent)?
            .winner(key)
            .ok_or(Error::ElementNotFound(parent))?;
        self.remove(parent, created_at)
    }

    /// Replaces the content of the text element `text`.
    pub fn edit(&mut self, text: TimeTicket, content: &str) -> Result<()> {
        let ticket = self.clock.issue();
        self.record(EditOperation::new(text, content, ticket).into())
    }

    /// Adds `delta` to the counter element `counter`.
    pub fn increment(&mut self, counter: TimeTicket, delta: i64) -> Result<()> {
        let ticket = self.clock.issue();
        self.record(IncrementOperation::new(counter, delta, ticket).into())
    }

    pub(crate) fn into_operations(self) -> Vec<Operation> {
        self.operations
    }
}
