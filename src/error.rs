//! Error types shared by the document model and the client.

use thiserror::Error;

use crate::crdt::TimeTicket;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by document operations and the replication client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A call that needs an activated client was made while deactivated.
    #[error("client {0} is not active")]
    ClientNotActive(String),

    /// The document is not attached to this client.
    #[error("document {0} is not attached")]
    DocumentNotAttached(String),

    /// An operation referenced an element this replica has never seen.
    #[error("element {0} not found")]
    ElementNotFound(TimeTicket),

    /// The resolved element is not of the variant the operation needs.
    #[error("element {ticket} is not {expected}")]
    UnexpectedElementType {
        ticket: TimeTicket,
        expected: &'static str,
    },

    /// A creation ticket was registered twice.
    #[error("creation ticket {0} is already registered")]
    DuplicateTicket(TimeTicket),

    /// The RPC collaborator reported a failure.
    #[error("rpc {method} failed: {reason}")]
    Rpc {
        method: &'static str,
        reason: String,
    },

    /// An actor id could not be parsed.
    #[error("invalid actor id: {0}")]
    InvalidActorId(String),

    /// JSON encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Builds an [`Error::Rpc`] from any displayable transport error.
    pub fn rpc(method: &'static str, reason: impl std::fmt::Display) -> Self {
        Error::Rpc {
            method,
            reason: reason.to_string(),
        }
    }

    /// Returns true for errors that mean a remote change cannot be applied
    /// because its causal dependencies are missing or malformed.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            Error::ElementNotFound(_) | Error::UnexpectedElementType { .. }
        )
    }
}
