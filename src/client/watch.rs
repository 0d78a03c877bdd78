//! The watch subscription and the handling of peer events.

use std::sync::{Arc, Weak};

use futures_util::StreamExt;
use tracing::{debug, info, warn};

use crate::client::event::{ClientEvent, ClientStatus, StreamConnectionStatus};
use crate::client::rpc::{DocEventType, PeerClient, WatchDocumentsResponse};
use crate::client::{Client, Shared, peers_by_document};

impl Client {
    /// Restarts the watch loop for the current set of realtime documents.
    pub(super) fn run_watch_loop(&self) {
        debug!("[WL] c:\"{}\" run watch loop", self.key());
        self.cancel_watch_loop();
        let handle = tokio::spawn(watch_loop(Arc::downgrade(&self.shared)));
        self.shared.state.lock().watch_loop = Some(handle);
    }

    /// Stops the watch loop, closing its stream. Subscribers see the stream
    /// disconnect if it was open.
    pub(super) fn cancel_watch_loop(&self) {
        let was_connected = {
            let mut state = self.shared.state.lock();
            if let Some(watch_loop) = state.watch_loop.take() {
                watch_loop.abort();
            }
            std::mem::replace(&mut state.stream_connected, false)
        };
        if was_connected {
            self.publish(ClientEvent::StreamConnectionStatusChanged(
                StreamConnectionStatus::Disconnected,
            ));
        }
    }

    /// The identity to watch with and the sorted realtime document keys, or
    /// `None` when there is nothing to watch.
    fn watch_target(&self) -> Option<(PeerClient, Vec<String>)> {
        let state = self.shared.state.lock();
        let id = state.id?;
        if state.status != ClientStatus::Activated {
            return None;
        }

        let mut keys: Vec<String> = state
            .attachments
            .iter()
            .filter(|(_, attachment)| attachment.is_realtime_sync)
            .map(|(key, _)| key.clone())
            .collect();
        if keys.is_empty() {
            return None;
        }
        keys.sort();

        Some((
            PeerClient {
                id,
                presence: state.presence.clone(),
            },
            keys,
        ))
    }

    fn set_stream_connected(&self, connected: bool) {
        self.shared.state.lock().stream_connected = connected;
        let status = if connected {
            StreamConnectionStatus::Connected
        } else {
            StreamConnectionStatus::Disconnected
        };
        self.publish(ClientEvent::StreamConnectionStatusChanged(status));
    }

    /// Applies one message from the watch stream opened for `keys`.
    pub(super) fn handle_watch_response(&self, keys: &[String], response: WatchDocumentsResponse) {
        let event = {
            let mut state = self.shared.state.lock();
            match response {
                WatchDocumentsResponse::Initialization { peers_by_doc } => {
                    for (doc_key, peers) in peers_by_doc {
                        let Some(attachment) = state.attachments.get_mut(&doc_key) else {
                            continue;
                        };
                        for peer in peers {
                            attachment.peer_presence_map.insert(peer.id, peer.presence);
                        }
                    }
                    Some(ClientEvent::PeersChanged(peers_by_document(&state.attachments, keys)))
                }
                WatchDocumentsResponse::Event(event) => {
                    let publisher = event.publisher;
                    let mut changed = false;
                    for doc_key in &event.document_keys {
                        let Some(attachment) = state.attachments.get_mut(doc_key) else {
                            continue;
                        };
                        match event.event_type {
                            DocEventType::DocumentsWatched => {
                                attachment
                                    .peer_presence_map
                                    .insert(publisher.id, publisher.presence.clone());
                                changed = true;
                            }
                            DocEventType::DocumentsUnwatched => {
                                changed |= attachment.peer_presence_map.remove(&publisher.id).is_some();
                            }
                            DocEventType::DocumentsChanged => {
                                attachment.remote_change_event_received = true;
                                changed = true;
                            }
                            DocEventType::PresenceChanged => {
                                changed |= attachment.merge_presence(publisher.id, publisher.presence.clone());
                            }
                        }
                    }

                    match event.event_type {
                        _ if !changed => None,
                        DocEventType::DocumentsChanged => Some(ClientEvent::DocumentsChanged(event.document_keys)),
                        _ => Some(ClientEvent::PeersChanged(peers_by_document(
                            &state.attachments,
                            &event.document_keys,
                        ))),
                    }
                }
            }
        };

        if let Some(event) = event {
            self.publish(event);
        }
    }
}

async fn watch_loop(weak: Weak<Shared>) {
    loop {
        let Some(client) = upgrade(&weak) else {
            return;
        };
        let Some((peer, keys)) = client.watch_target() else {
            debug!("[WL] c:\"{}\" nothing to watch", client.key());
            return;
        };
        let rpc = client.shared.rpc.clone();
        let reconnect_delay = client.shared.reconnect_stream_delay;
        drop(client);

        match rpc.watch_documents(&peer, &keys).await {
            Ok(mut stream) => {
                let Some(client) = upgrade(&weak) else {
                    return;
                };
                client.set_stream_connected(true);
                info!("[WD] c:\"{}\" watches d:\"{}\"", client.key(), keys.join(","));
                drop(client);

                while let Some(item) = stream.next().await {
                    let Some(client) = upgrade(&weak) else {
                        return;
                    };
                    match item {
                        Ok(response) => client.handle_watch_response(&keys, response),
                        Err(e) => {
                            warn!("[WD] c:\"{}\" stream error: {}", client.key(), e);
                            break;
                        }
                    }
                }
            }
            Err(e) => warn!("[WD] cannot open watch stream: {}", e),
        }

        let Some(client) = upgrade(&weak) else {
            return;
        };
        client.set_stream_connected(false);
        drop(client);

        tokio::time::sleep(reconnect_delay).await;
    }
}

fn upgrade(weak: &Weak<Shared>) -> Option<Client> {
    weak.upgrade().map(|shared| Client { shared })
}
