//! Logical clock types for the document model.
//!
//! This module contains the identifiers and timestamps used to name every
//! element and every operation effect.

pub mod actor;
pub mod clock;
pub mod ticket;

pub use actor::{ACTOR_ID_LEN, ActorId};
pub use clock::LogicalClock;
pub use ticket::TimeTicket;
