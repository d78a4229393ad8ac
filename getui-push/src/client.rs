//! Authenticating gateway client.
//!
//! Every call goes out under the client's current session. A `sign_error`
//! answer triggers one re-authentication and one replay of the identical
//! body; whatever the replay yields is final.

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::auth::{AuthSession, SessionStore};
use crate::transport::{GatewayReply, Transport};
use crate::{PushError, Result};

/// Gateway client that owns the authentication session.
pub struct AuthenticatingClient<T> {
    transport: T,
    app_key: String,
    master_secret: String,
    sessions: SessionStore,
    refresh: Mutex<()>,
}

impl<T: Transport> AuthenticatingClient<T> {
    /// Create a client. No request is made until the first call.
    pub fn new(transport: T, app_key: impl Into<String>, master_secret: impl Into<String>) -> Self {
        Self {
            transport,
            app_key: app_key.into(),
            master_secret: master_secret.into(),
            sessions: SessionStore::new(),
            refresh: Mutex::new(()),
        }
    }

    /// Get the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get the current session, if any.
    pub fn session(&self) -> Option<AuthSession> {
        self.sessions.session()
    }

    /// Number of sessions established so far.
    pub fn session_generation(&self) -> u64 {
        self.sessions.generation()
    }

    /// Sign a fresh session and register it with the gateway.
    pub async fn authenticate(&self) -> Result<AuthSession> {
        let _guard = self.refresh.lock().await;
        self.connect().await
    }

    /// Send a request, re-authenticating and replaying once on `sign_error`.
    pub async fn send(&self, body: &Value) -> Result<Value> {
        let generation = self.ensure_session().await?;

        let reply = self.transport.post(body).await?;
        if !reply.is_sign_error() {
            return reply.into_body();
        }

        warn!(
            action = action_of(body),
            "Gateway rejected signature, re-authenticating"
        );
        self.refresh_after(generation).await?;

        let replay = self.transport.post(body).await?;
        if replay.is_sign_error() {
            warn!(action = action_of(body), "Replay rejected after re-authentication");
            return Err(PushError::AuthRejected { body: replay.body });
        }

        replay.into_body()
    }

    /// Make sure a session exists, returning the generation in use.
    async fn ensure_session(&self) -> Result<u64> {
        if let Some((generation, _)) = self.sessions.snapshot() {
            return Ok(generation);
        }

        let _guard = self.refresh.lock().await;
        if let Some((generation, _)) = self.sessions.snapshot() {
            return Ok(generation);
        }

        self.connect().await?;
        Ok(self.sessions.generation())
    }

    /// Replace the session that was rejected.
    ///
    /// If another call already replaced it while this one waited for the
    /// lock, the newer session is reused.
    async fn refresh_after(&self, rejected: u64) -> Result<()> {
        let _guard = self.refresh.lock().await;
        if self.sessions.generation() != rejected {
            debug!("Session already refreshed by a concurrent call");
            return Ok(());
        }

        self.connect().await.map(|_| ())
    }

    /// Perform the `connect` round trip. Callers hold the refresh lock.
    async fn connect(&self) -> Result<AuthSession> {
        let session = AuthSession::now(self.app_key.clone(), &self.master_secret);
        let request = serde_json::to_value(session.connect_request())?;

        let reply = self.transport.post(&request).await?;
        check_connect(&reply)?;

        let generation = self.sessions.store(session.clone());
        info!(generation, timestamp = session.timestamp, "Authenticated with gateway");

        Ok(session)
    }
}

/// Any 200 reply to `connect` opens a new session, whatever its body says.
/// A rejected signature only surfaces on the calls that follow.
fn check_connect(reply: &GatewayReply) -> Result<()> {
    if reply.status != 200 {
        return Err(PushError::UpstreamStatus {
            status: reply.status,
            body: reply.body.to_string(),
        });
    }

    if let Some(result) = reply.result()
        && result != "success"
    {
        debug!(result, "Gateway answered connect without success");
    }
    Ok(())
}

fn action_of(body: &Value) -> &str {
    body.get("action").and_then(Value::as_str).unwrap_or_default()
}
