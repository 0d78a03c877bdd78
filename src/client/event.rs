//! Events the client publishes to its subscribers.

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::client::attachment::PeersByDocument;

/// Whether the client is registered with the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientStatus {
    Deactivated,
    Activated,
}

/// State of the watch stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamConnectionStatus {
    Connected,
    Disconnected,
}

/// Outcome of a push-pull round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentSyncResult {
    Synced,
    SyncFailed,
}

/// An event that occurs in a [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    StatusChanged(ClientStatus),
    /// Remote changes are waiting to be pulled for these document keys.
    DocumentsChanged(Vec<String>),
    PeersChanged(PeersByDocument),
    StreamConnectionStatusChanged(StreamConnectionStatus),
    DocumentSynced(DocumentSyncResult),
}

/// Fans events out to one channel per subscriber.
///
/// Events are posted in order; subscribers that dropped their receiver are
/// pruned on the next post.
#[derive(Debug, Default)]
pub(crate) struct EventBus {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<ClientEvent>>>,
}

impl EventBus {
    pub(crate) fn subscribe(&self) -> mpsc::UnboundedReceiver<ClientEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }

    pub(crate) fn publish(&self, event: ClientEvent) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}
