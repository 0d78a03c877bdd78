//! Per-document client state and peer presence.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::crdt::ActorId;
use crate::document::Document;

/// Application-defined presence payload.
pub type Presence = serde_json::Map<String, serde_json::Value>;

/// A document shared between the application and the client loops.
pub type DocumentHandle = Arc<RwLock<Document>>;

/// Peer presence per document key, keyed by actor hex id.
pub type PeersByDocument = BTreeMap<String, BTreeMap<String, Presence>>;

/// Presence data stamped with a per-client monotonic clock.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresenceInfo {
    pub clock: u64,
    pub data: Presence,
}

impl PresenceInfo {
    pub fn new(clock: u64, data: Presence) -> Self {
        PresenceInfo { clock, data }
    }
}

/// A document attached to a client.
#[derive(Debug)]
pub struct Attachment {
    pub doc: DocumentHandle,
    pub is_realtime_sync: bool,
    pub peer_presence_map: HashMap<ActorId, PresenceInfo>,
    /// Set by the watch loop, consumed by the next sync loop iteration.
    pub remote_change_event_received: bool,
}

impl Attachment {
    pub fn new(doc: DocumentHandle, is_realtime_sync: bool) -> Self {
        Attachment {
            doc,
            is_realtime_sync,
            peer_presence_map: HashMap::new(),
            remote_change_event_received: false,
        }
    }

    /// Records `presence` for `peer` unless a newer one is already stored.
    ///
    /// Returns true if the map changed.
    pub fn merge_presence(&mut self, peer: ActorId, presence: PresenceInfo) -> bool {
        match self.peer_presence_map.get(&peer) {
            Some(stored) if presence.clock <= stored.clock => false,
            _ => {
                self.peer_presence_map.insert(peer, presence);
                true
            }
        }
    }

    /// Presence data of every known peer.
    pub fn peers(&self) -> BTreeMap<String, Presence> {
        self.peer_presence_map
            .iter()
            .map(|(id, info)| (id.to_hex(), info.data.clone()))
            .collect()
    }
}
