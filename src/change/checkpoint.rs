//! Sequence checkpoint carried by every change pack.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The last client and server sequence numbers both sides agree on.
///
/// Its client sequence drops acknowledged local changes; its server sequence
/// tells the server where the next pull starts. Redelivered remote changes are
/// filtered per actor by the document, not by the checkpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub client_seq: u32,
    pub server_seq: u64,
}

impl Checkpoint {
    pub const INITIAL: Checkpoint = Checkpoint {
        client_seq: 0,
        server_seq: 0,
    };

    pub fn new(client_seq: u32, server_seq: u64) -> Self {
        Checkpoint {
            client_seq,
            server_seq,
        }
    }

    /// Returns a checkpoint whose client sequence is advanced by `n`.
    pub fn increase_client_seq(self, n: u32) -> Self {
        Checkpoint {
            client_seq: self.client_seq + n,
            ..self
        }
    }

    /// Component-wise maximum of two checkpoints.
    pub fn forward(self, other: Checkpoint) -> Self {
        Checkpoint {
            client_seq: self.client_seq.max(other.client_seq),
            server_seq: self.server_seq.max(other.server_seq),
        }
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "serverSeq={}, clientSeq={}", self.server_seq, self.client_seq)
    }
}
