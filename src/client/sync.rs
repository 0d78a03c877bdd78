//! Push-pull rounds and the background sync loop.

use std::sync::{Arc, Weak};

use futures_util::future::join_all;
use tracing::{debug, error, info};

use crate::client::attachment::DocumentHandle;
use crate::client::event::{ClientEvent, DocumentSyncResult};
use crate::client::{Client, Shared};
use crate::error::Result;

impl Client {
    pub(super) fn run_sync_loop(&self) {
        debug!("[SL] c:\"{}\" run sync loop", self.key());
        let handle = tokio::spawn(sync_loop(Arc::downgrade(&self.shared)));
        if let Some(previous) = self.shared.state.lock().sync_loop.replace(handle) {
            previous.abort();
        }
    }

    /// One push-pull round for `doc`.
    pub(super) async fn sync_internal(&self, doc: DocumentHandle) -> Result<DocumentHandle> {
        let id = self.ensure_active()?;

        let pack = doc.read().create_change_pack();
        let doc_key = pack.document_key.clone();
        let push_size = pack.change_size();

        let response = self
            .shared
            .rpc
            .push_pull(&id, pack)
            .await
            .inspect_err(|e| error!("[PP] c:\"{}\" err: {}", self.key(), e))?;
        let pull_size = response.change_size();
        let checkpoint = response.checkpoint;
        doc.write().apply_change_pack(response);

        self.publish(ClientEvent::DocumentSynced(DocumentSyncResult::Synced));
        info!(
            "[PP] c:\"{}\" sync d:\"{}\", push:{} pull:{} cp:{}",
            self.key(),
            doc_key,
            push_size,
            pull_size,
            checkpoint
        );
        Ok(doc)
    }

    /// Realtime documents with something to push or pull. Clears the remote
    /// change flag of every realtime document.
    ///
    /// Document locks are only taken after the client state is released.
    fn take_pending_documents(&self) -> Vec<DocumentHandle> {
        let candidates: Vec<(DocumentHandle, bool)> = {
            let mut state = self.shared.state.lock();
            state
                .attachments
                .values_mut()
                .filter(|attachment| attachment.is_realtime_sync)
                .map(|attachment| {
                    let remote_changed = std::mem::take(&mut attachment.remote_change_event_received);
                    (attachment.doc.clone(), remote_changed)
                })
                .collect()
        };

        candidates
            .into_iter()
            .filter(|(doc, remote_changed)| *remote_changed || doc.read().has_local_changes())
            .map(|(doc, _)| doc)
            .collect()
    }
}

async fn sync_loop(weak: Weak<Shared>) {
    loop {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        let client = Client { shared };
        if !client.is_active() {
            debug!("[SL] c:\"{}\" exit sync loop", client.key());
            return;
        }

        let docs = client.take_pending_documents();
        let results = join_all(docs.into_iter().map(|doc| client.sync_internal(doc))).await;

        let delay = match results.into_iter().find_map(|result| result.err()) {
            Some(e) => {
                error!("[SL] c:\"{}\" sync failed: {}", client.key(), e);
                client.publish(ClientEvent::DocumentSynced(DocumentSyncResult::SyncFailed));
                client.shared.reconnect_stream_delay
            }
            None if client.shared.state.lock().stream_connected => client.shared.sync_loop_duration,
            None => client.shared.reconnect_stream_delay,
        };

        drop(client);
        tokio::time::sleep(delay).await;
    }
}
