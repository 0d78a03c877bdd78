//! Operations that mutate a document root.
//!
//! Every operation names its target container by creation ticket and carries
//! the ticket at which it was executed. Conflicts are settled by comparing that
//! ticket against the last writer recorded on the element, keeping the larger.

use serde::{Deserialize, Serialize};

use crate::crdt::{ActorId, Root, TimeTicket};
use crate::error::Result;

pub mod add;
pub mod edit;
pub mod increment;
pub mod move_op;
pub mod remove;
pub mod set;

pub use add::AddOperation;
pub use edit::EditOperation;
pub use increment::IncrementOperation;
pub use move_op::MoveOperation;
pub use remove::RemoveOperation;
pub use set::SetOperation;

/// One mutation of the document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Set(SetOperation),
    Add(AddOperation),
    Move(MoveOperation),
    Remove(RemoveOperation),
    Edit(EditOperation),
    Increment(IncrementOperation),
}

impl Operation {
    /// Applies this operation to `root`.
    ///
    /// Fails with [`Error::ElementNotFound`](crate::Error::ElementNotFound) or
    /// [`Error::UnexpectedElementType`](crate::Error::UnexpectedElementType)
    /// when the target cannot be resolved; the caller decides what to discard.
    pub fn execute(&self, root: &mut Root) -> Result<()> {
        match self {
            Operation::Set(op) => op.execute(root),
            Operation::Add(op) => op.execute(root),
            Operation::Move(op) => op.execute(root),
            Operation::Remove(op) => op.execute(root),
            Operation::Edit(op) => op.execute(root),
            Operation::Increment(op) => op.execute(root),
        }
    }

    /// The container this operation targets.
    pub fn parent_created_at(&self) -> TimeTicket {
        match self {
            Operation::Set(op) => op.parent_created_at,
            Operation::Add(op) => op.parent_created_at,
            Operation::Move(op) => op.parent_created_at,
            Operation::Remove(op) => op.parent_created_at,
            Operation::Edit(op) => op.parent_created_at,
            Operation::Increment(op) => op.parent_created_at,
        }
    }

    /// The logical time of this operation.
    pub fn executed_at(&self) -> TimeTicket {
        match self {
            Operation::Set(op) => op.executed_at,
            Operation::Add(op) => op.executed_at,
            Operation::Move(op) => op.executed_at,
            Operation::Remove(op) => op.executed_at,
            Operation::Edit(op) => op.executed_at,
            Operation::Increment(op) => op.executed_at,
        }
    }

    /// The element whose state this operation changes.
    pub fn effected_created_at(&self) -> TimeTicket {
        match self {
            Operation::Set(op) => op.executed_at,
            Operation::Add(op) => op.executed_at,
            Operation::Move(op) => op.created_at,
            Operation::Remove(op) => op.created_at,
            Operation::Edit(op) => op.parent_created_at,
            Operation::Increment(op) => op.parent_created_at,
        }
    }

    /// Compact description for log lines, e.g. `3:1:a1a1.MOV`.
    pub fn structure(&self) -> String {
        let tag = match self {
            Operation::Set(_) => "SET",
            Operation::Add(_) => "ADD",
            Operation::Move(_) => "MOV",
            Operation::Remove(_) => "REM",
            Operation::Edit(_) => "EDIT",
            Operation::Increment(_) => "INC",
        };
        format!("{}.{}", self.parent_created_at().structure(), tag)
    }

    /// Claims every ticket issued before the replica knew its actor.
    pub(crate) fn set_actor(&mut self, actor: ActorId) {
        let claim = |ticket: &mut TimeTicket| *ticket = ticket.claimed_by(actor);
        match self {
            Operation::Set(op) => {
                claim(&mut op.parent_created_at);
                claim(&mut op.executed_at);
            }
            Operation::Add(op) => {
                claim(&mut op.parent_created_at);
                claim(&mut op.prev_created_at);
                claim(&mut op.executed_at);
            }
            Operation::Move(op) => {
                claim(&mut op.parent_created_at);
                claim(&mut op.prev_created_at);
                claim(&mut op.created_at);
                claim(&mut op.executed_at);
            }
            Operation::Remove(op) => {
                claim(&mut op.parent_created_at);
                claim(&mut op.created_at);
                claim(&mut op.executed_at);
            }
            Operation::Edit(op) => {
                claim(&mut op.parent_created_at);
                claim(&mut op.executed_at);
            }
            Operation::Increment(op) => {
                claim(&mut op.parent_created_at);
                claim(&mut op.executed_at);
            }
        }
    }
}

macro_rules! impl_from_operation {
    ($($variant:ident => $ty:ty),*) => {
        $(
            impl From<$ty> for Operation {
                fn from(op: $ty) -> Self {
                    Operation::$variant(op)
                }
            }
        )*
    };
}

impl_from_operation!(
    Set => SetOperation,
    Add => AddOperation,
    Move => MoveOperation,
    Remove => RemoveOperation,
    Edit => EditOperation,
    Increment => IncrementOperation
);
