//! The RPC surface the client consumes.
//!
//! Wire encoding and transport are supplied by the embedding application
//! through [`RpcClient`]; this module only fixes the message shapes.

use std::collections::HashMap;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::change::ChangePack;
use crate::client::attachment::PresenceInfo;
use crate::crdt::ActorId;
use crate::error::Result;

/// A client as seen by the server and by peers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerClient {
    pub id: ActorId,
    pub presence: PresenceInfo,
}

/// Kinds of document events delivered through the watch stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocEventType {
    DocumentsWatched,
    DocumentsUnwatched,
    DocumentsChanged,
    PresenceChanged,
}

/// One event published by a peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchEvent {
    #[serde(rename = "type")]
    pub event_type: DocEventType,
    pub document_keys: Vec<String>,
    pub publisher: PeerClient,
}

/// A message received on the watch stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchDocumentsResponse {
    /// Authoritative snapshot of the peers watching each document.
    Initialization {
        peers_by_doc: HashMap<String, Vec<PeerClient>>,
    },
    Event(WatchEvent),
}

/// A long-lived subscription; ends when the server closes it or on error.
/// Dropping it closes the subscription.
pub type WatchStream = BoxStream<'static, Result<WatchDocumentsResponse>>;

/// Calls the client makes to the server.
#[async_trait]
pub trait RpcClient: Send + Sync {
    /// Registers the client and returns the actor id the server assigned.
    async fn activate_client(&self, client_key: &str) -> Result<ActorId>;

    async fn deactivate_client(&self, client_id: &ActorId) -> Result<()>;

    /// Sends the document's full pack and returns the server's resulting pack.
    async fn attach_document(&self, client_id: &ActorId, pack: ChangePack) -> Result<ChangePack>;

    async fn detach_document(&self, client_id: &ActorId, pack: ChangePack) -> Result<ChangePack>;

    /// Pushes local changes and pulls the changes other replicas made.
    async fn push_pull(&self, client_id: &ActorId, pack: ChangePack) -> Result<ChangePack>;

    async fn update_presence(&self, client: &PeerClient, document_keys: &[String]) -> Result<()>;

    /// Opens a watch stream covering `document_keys`.
    async fn watch_documents(&self, client: &PeerClient, document_keys: &[String]) -> Result<WatchStream>;
}
