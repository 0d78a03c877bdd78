//! # crdt-sync - replicated JSON documents with array move
//!
//! A CRDT document engine and the client half of a replication protocol.
//! Replicas edit a tree of elements (objects, arrays, primitives, text,
//! counters) and exchange changes through a server; every replica that has
//! seen the same set of changes renders the same document.
//!
//! ## Features
//!
//! - **Totally ordered tickets**: every operation carries a lamport-based
//!   [`TimeTicket`] that breaks ties by delimiter and actor id
//! - **Concurrent array moves**: the latest move of an element wins and
//!   concurrent inserts keep a deterministic order
//! - **Tombstones**: removed elements stay resolvable until every replica has
//!   seen the removal, then get garbage collected
//! - **Client loops**: push-pull synchronization, a watch stream with
//!   reconnects, and peer presence
//!
//! ## Example
//!
//! ```rust
//! use crdt_sync::{Document, ElementValue};
//!
//! let mut doc = Document::new("todo");
//! doc.update(|ctx| {
//!     let root = ctx.root_created_at();
//!     let list = ctx.set(root, "list", ElementValue::Array)?;
//!     ctx.push(list, "milk")?;
//!     let eggs = ctx.push(list, "eggs")?;
//!     ctx.move_front(list, eggs)?;
//!     Ok(())
//! })
//! .unwrap();
//!
//! assert_eq!(doc.marshal().unwrap(), r#"{"list":["eggs","milk"]}"#);
//! ```

pub mod change;
pub mod client;
pub mod crdt;
pub mod document;
pub mod error;
pub mod operation;

// Re-export the main public API
pub use change::{Change, ChangeId, ChangePack, Checkpoint};
pub use client::{Client, ClientEvent, ClientOptions, ClientStatus, DocumentHandle, RpcClient};
pub use crdt::{ActorId, ElementValue, LogicalClock, Primitive, Root, TimeTicket};
pub use document::{ChangeContext, Document};
pub use error::{Error, Result};
pub use operation::Operation;
