//! CRDT document model.
//!
//! This module contains the logical clock types, the element variants, and the
//! document root that registers every element by its creation ticket.

pub mod array;
pub mod element;
pub mod object;
pub mod root;
pub mod types;

// Re-export the main public API
pub use array::{ArrayElement, ArrayEntry};
pub use element::{CounterElement, Element, ElementNode, ElementValue, Primitive, TextElement};
pub use object::{ObjectElement, ObjectMember};
pub use root::{Descendants, Root};
pub use types::{ACTOR_ID_LEN, ActorId, LogicalClock, TimeTicket};
