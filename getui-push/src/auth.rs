//! Request signing and the shared gateway session.

use md5::{Digest, Md5};
use parking_lot::RwLock;
use serde::Serialize;

use crate::request::{PROTOCOL_VERSION, action};

/// Compute the `connect` signature: hex MD5 of key, timestamp and secret.
pub fn sign(app_key: &str, timestamp: i64, master_secret: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(app_key.as_bytes());
    hasher.update(timestamp.to_string().as_bytes());
    hasher.update(master_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Current time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// A signed proof of identity for the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    /// App key.
    pub app_key: String,
    /// Signing time in epoch milliseconds.
    pub timestamp: i64,
    /// Signature over key, timestamp and secret.
    pub sign: String,
}

impl AuthSession {
    /// Sign at the given time.
    pub fn new(app_key: impl Into<String>, master_secret: &str, timestamp: i64) -> Self {
        let app_key = app_key.into();
        let sign = sign(&app_key, timestamp, master_secret);
        Self {
            app_key,
            timestamp,
            sign,
        }
    }

    /// Sign now.
    pub fn now(app_key: impl Into<String>, master_secret: &str) -> Self {
        Self::new(app_key, master_secret, now_millis())
    }

    /// Build the `connect` request for this session.
    pub fn connect_request(&self) -> ConnectRequest<'_> {
        ConnectRequest {
            action: action::CONNECT,
            appkey: &self.app_key,
            time_stamp: self.timestamp,
            sign: &self.sign,
            version: PROTOCOL_VERSION,
        }
    }
}

/// Body of the `connect` action.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequest<'a> {
    action: &'static str,
    appkey: &'a str,
    time_stamp: i64,
    sign: &'a str,
    version: &'static str,
}

/// Session slot shared by every call of a client.
///
/// Readers get a consistent snapshot. Each stored session carries a
/// generation so a caller can tell whether someone else already replaced the
/// session it was rejected with.
#[derive(Debug, Default)]
pub struct SessionStore {
    current: RwLock<Option<(u64, AuthSession)>>,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the current session and its generation.
    pub fn snapshot(&self) -> Option<(u64, AuthSession)> {
        self.current.read().clone()
    }

    /// Get the current session.
    pub fn session(&self) -> Option<AuthSession> {
        self.current.read().as_ref().map(|(_, s)| s.clone())
    }

    /// Get the current generation, `0` before the first session.
    pub fn generation(&self) -> u64 {
        self.current.read().as_ref().map_or(0, |(g, _)| *g)
    }

    /// Replace the session, returning its generation.
    pub fn store(&self, session: AuthSession) -> u64 {
        let mut current = self.current.write();
        let generation = current.as_ref().map_or(0, |(g, _)| *g) + 1;
        *current = Some((generation, session));
        generation
    }

    /// Drop the session.
    pub fn clear(&self) {
        *self.current.write() = None;
    }
}
