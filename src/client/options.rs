//! Client configuration.

use std::time::Duration;

use crate::client::attachment::Presence;

/// Default pause between two sync loop iterations.
pub const DEFAULT_SYNC_LOOP_DURATION: Duration = Duration::from_millis(50);

/// Default delay before a dropped watch stream is reopened.
pub const DEFAULT_RECONNECT_STREAM_DELAY: Duration = Duration::from_millis(1000);

/// User-settable options used when creating a [`Client`](crate::Client).
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Identifies the client to the server. A random UUID when unset.
    pub key: Option<String>,
    /// Initial presence shared with peers of attached documents.
    pub presence: Presence,
    /// API key of the project.
    pub api_key: Option<String>,
    /// Authentication token of the user.
    pub token: Option<String>,
    /// Pause between sync loop iterations while the watch stream is up.
    pub sync_loop_duration: Duration,
    /// Delay before reopening a dropped watch stream. The sync loop backs
    /// off to this cadence while the stream is down.
    pub reconnect_stream_delay: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        ClientOptions {
            key: None,
            presence: Presence::new(),
            api_key: None,
            token: None,
            sync_loop_duration: DEFAULT_SYNC_LOOP_DURATION,
            reconnect_stream_delay: DEFAULT_RECONNECT_STREAM_DELAY,
        }
    }
}

impl ClientOptions {
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_presence(mut self, presence: Presence) -> Self {
        self.presence = presence;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_sync_loop_duration(mut self, duration: Duration) -> Self {
        self.sync_loop_duration = duration;
        self
    }

    pub fn with_reconnect_stream_delay(mut self, delay: Duration) -> Self {
        self.reconnect_stream_delay = delay;
        self
    }

    /// Header pairs an RPC transport should attach to every call.
    pub fn auth_metadata(&self) -> Vec<(&'static str, String)> {
        let mut metadata = Vec::new();
        if let Some(api_key) = &self.api_key {
            metadata.push(("x-api-key", api_key.clone()));
        }
        if let Some(token) = &self.token {
            metadata.push(("authorization", token.clone()));
        }
        metadata
    }
}
