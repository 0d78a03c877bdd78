//! Replication client: connection lifecycle, push-pull synchronization, the
//! watch subscription and peer presence.
//!
//! All client state sits behind one mutex that is never held across an await
//! point. The sync loop and the watch loop run as tokio tasks holding only a
//! weak handle, so they stop once the last [`Client`] is dropped.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use crate::crdt::ActorId;
use crate::error::{Error, Result};

pub mod attachment;
pub mod event;
pub mod options;
pub mod rpc;
mod sync;
mod watch;

pub use attachment::{Attachment, DocumentHandle, PeersByDocument, Presence, PresenceInfo};
pub use event::{ClientEvent, ClientStatus, DocumentSyncResult, StreamConnectionStatus};
pub use options::ClientOptions;
pub use rpc::{DocEventType, PeerClient, RpcClient, WatchDocumentsResponse, WatchEvent, WatchStream};

use event::EventBus;

/// A client that keeps attached documents in sync with a server.
///
/// Cloning a client yields another handle to the same client.
#[derive(Clone)]
pub struct Client {
    shared: Arc<Shared>,
}

struct Shared {
    key: String,
    rpc: Arc<dyn RpcClient>,
    sync_loop_duration: Duration,
    reconnect_stream_delay: Duration,
    state: Mutex<ClientState>,
    events: EventBus,
}

struct ClientState {
    id: Option<ActorId>,
    status: ClientStatus,
    presence: PresenceInfo,
    attachments: HashMap<String, Attachment>,
    stream_connected: bool,
    sync_loop: Option<JoinHandle<()>>,
    watch_loop: Option<JoinHandle<()>>,
}

impl Client {
    /// Creates a deactivated client talking to the server through `rpc`.
    pub fn new(rpc: Arc<dyn RpcClient>, options: ClientOptions) -> Self {
        let key = options
            .key
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        Client {
            shared: Arc::new(Shared {
                key,
                rpc,
                sync_loop_duration: options.sync_loop_duration,
                reconnect_stream_delay: options.reconnect_stream_delay,
                state: Mutex::new(ClientState {
                    id: None,
                    status: ClientStatus::Deactivated,
                    presence: PresenceInfo::new(0, options.presence),
                    attachments: HashMap::new(),
                    stream_connected: false,
                    sync_loop: None,
                    watch_loop: None,
                }),
                events: EventBus::default(),
            }),
        }
    }

    /// Registers this client with the server and starts the sync and watch
    /// loops. Does nothing if already active.
    pub async fn activate(&self) -> Result<()> {
        if self.is_active() {
            return Ok(());
        }

        let id = self
            .shared
            .rpc
            .activate_client(&self.shared.key)
            .await
            .inspect_err(|e| error!("[AC] c:\"{}\" err: {}", self.key(), e))?;

        {
            let mut state = self.shared.state.lock();
            state.id = Some(id);
            state.status = ClientStatus::Activated;
        }
        self.publish(ClientEvent::StatusChanged(ClientStatus::Activated));
        self.run_sync_loop();
        self.run_watch_loop();

        info!("[AC] c:\"{}\" activated, id:\"{}\"", self.key(), id);
        Ok(())
    }

    /// Closes the watch stream and tells the server this client is leaving.
    /// Does nothing if already deactivated.
    pub async fn deactivate(&self) -> Result<()> {
        let id = {
            let state = self.shared.state.lock();
            if state.status == ClientStatus::Deactivated {
                return Ok(());
            }
            state.id
        };
        let id = id.ok_or_else(|| self.not_active())?;

        self.cancel_watch_loop();
        self.shared
            .rpc
            .deactivate_client(&id)
            .await
            .inspect_err(|e| error!("[DC] c:\"{}\" err: {}", self.key(), e))?;

        {
            let mut state = self.shared.state.lock();
            state.status = ClientStatus::Deactivated;
            if let Some(sync_loop) = state.sync_loop.take() {
                sync_loop.abort();
            }
        }
        self.publish(ClientEvent::StatusChanged(ClientStatus::Deactivated));

        info!("[DC] c:\"{}\" deactivated", self.key());
        Ok(())
    }

    /// Attaches `doc` to this client.
    ///
    /// The document takes this client's actor id, its pending changes are
    /// sent to the server, and the server's pack is applied. Unless
    /// `is_manual_sync` is set, the sync and watch loops keep it up to date.
    pub async fn attach(&self, doc: DocumentHandle, is_manual_sync: bool) -> Result<DocumentHandle> {
        let id = self.ensure_active()?;

        let pack = {
            let mut doc = doc.write();
            doc.set_actor(id);
            doc.create_change_pack()
        };
        let doc_key = pack.document_key.clone();

        let response = self
            .shared
            .rpc
            .attach_document(&id, pack)
            .await
            .inspect_err(|e| error!("[AD] c:\"{}\" err: {}", self.key(), e))?;
        doc.write().apply_change_pack(response);

        self.shared
            .state
            .lock()
            .attachments
            .insert(doc_key.clone(), Attachment::new(doc.clone(), !is_manual_sync));
        self.run_watch_loop();

        info!("[AD] c:\"{}\" attaches d:\"{}\"", self.key(), doc_key);
        Ok(doc)
    }

    /// Detaches `doc`; the server stops tracking this client for it.
    pub async fn detach(&self, doc: DocumentHandle) -> Result<DocumentHandle> {
        let id = self.ensure_active()?;

        let pack = doc.read().create_change_pack();
        let doc_key = pack.document_key.clone();
        if !self.shared.state.lock().attachments.contains_key(&doc_key) {
            return Err(Error::DocumentNotAttached(doc_key));
        }

        let response = self
            .shared
            .rpc
            .detach_document(&id, pack)
            .await
            .inspect_err(|e| error!("[DD] c:\"{}\" err: {}", self.key(), e))?;
        doc.write().apply_change_pack(response);

        self.shared.state.lock().attachments.remove(&doc_key);
        self.run_watch_loop();

        info!("[DD] c:\"{}\" detaches d:\"{}\"", self.key(), doc_key);
        Ok(doc)
    }

    /// Push-pulls every attached document, manual or realtime, concurrently.
    ///
    /// Documents whose round succeeded keep their result even when another
    /// one fails; the first failure is returned.
    pub async fn sync(&self) -> Result<Vec<DocumentHandle>> {
        self.ensure_active()?;
        let docs: Vec<DocumentHandle> = self
            .shared
            .state
            .lock()
            .attachments
            .values()
            .map(|attachment| attachment.doc.clone())
            .collect();

        let results = join_all(docs.into_iter().map(|doc| self.sync_internal(doc))).await;

        let mut synced = Vec::with_capacity(results.len());
        let mut failure = None;
        for result in results {
            match result {
                Ok(doc) => synced.push(doc),
                Err(e) => {
                    failure.get_or_insert(e);
                }
            }
        }

        match failure {
            Some(e) => {
                self.publish(ClientEvent::DocumentSynced(DocumentSyncResult::SyncFailed));
                Err(e)
            }
            None => Ok(synced),
        }
    }

    /// Sets `key` of this client's presence and shares it with peers.
    ///
    /// The local presence and every realtime attachment's peer map change
    /// immediately; the server is told afterwards and a failure there does
    /// not roll the local change back.
    pub async fn update_presence(&self, key: &str, value: serde_json::Value) -> Result<()> {
        let (client, document_keys, peers) = {
            let mut state = self.shared.state.lock();
            if state.status != ClientStatus::Activated {
                return Err(self.not_active());
            }
            let id = state.id.ok_or_else(|| self.not_active())?;

            state.presence.clock += 1;
            state.presence.data.insert(key.to_owned(), value);
            if state.attachments.is_empty() {
                return Ok(());
            }

            let presence = state.presence.clone();
            let mut document_keys = Vec::new();
            for (doc_key, attachment) in state.attachments.iter_mut() {
                if !attachment.is_realtime_sync {
                    continue;
                }
                attachment.peer_presence_map.insert(id, presence.clone());
                document_keys.push(doc_key.clone());
            }
            document_keys.sort();

            let peers = peers_by_document(&state.attachments, &document_keys);
            (PeerClient { id, presence }, document_keys, peers)
        };

        self.publish(ClientEvent::PeersChanged(peers));

        self.shared
            .rpc
            .update_presence(&client, &document_keys)
            .await
            .inspect_err(|e| error!("[UP] c:\"{}\" err: {}", self.key(), e))?;

        info!("[UP] c:\"{}\" updated presence", self.key());
        Ok(())
    }

    /// Returns a receiver for every event published from now on.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<ClientEvent> {
        self.shared.events.subscribe()
    }

    /// The actor id assigned at activation.
    pub fn id(&self) -> Option<ActorId> {
        self.shared.state.lock().id
    }

    pub fn key(&self) -> &str {
        &self.shared.key
    }

    pub fn status(&self) -> ClientStatus {
        self.shared.state.lock().status
    }

    pub fn is_active(&self) -> bool {
        self.status() == ClientStatus::Activated
    }

    /// This client's current presence data.
    pub fn presence(&self) -> Presence {
        self.shared.state.lock().presence.data.clone()
    }

    /// Presence of every known peer of an attached document.
    pub fn peers(&self, doc_key: &str) -> Result<BTreeMap<String, Presence>> {
        self.shared
            .state
            .lock()
            .attachments
            .get(doc_key)
            .map(Attachment::peers)
            .ok_or_else(|| Error::DocumentNotAttached(doc_key.to_owned()))
    }

    /// Returns true if `doc_key` is attached to this client.
    pub fn has_document(&self, doc_key: &str) -> bool {
        self.shared.state.lock().attachments.contains_key(doc_key)
    }

    fn ensure_active(&self) -> Result<ActorId> {
        let state = self.shared.state.lock();
        match (state.status, state.id) {
            (ClientStatus::Activated, Some(id)) => Ok(id),
            _ => Err(self.not_active()),
        }
    }

    fn not_active(&self) -> Error {
        Error::ClientNotActive(self.shared.key.clone())
    }

    fn publish(&self, event: ClientEvent) {
        self.shared.events.publish(event);
    }
}

/// Peer presence of the given attached documents.
fn peers_by_document(attachments: &HashMap<String, Attachment>, keys: &[String]) -> PeersByDocument {
    keys.iter()
        .filter_map(|key| {
            attachments
                .get(key)
                .map(|attachment| (key.clone(), attachment.peers()))
        })
        .collect()
}
