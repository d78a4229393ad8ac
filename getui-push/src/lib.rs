//! # Getui Push
//!
//! Client for the Getui mobile push gateway.
//!
//! ## Features
//!
//! - **Action chains**: the device-side state machine for notification and
//!   transmission messages
//! - **Transparent envelopes**: protobuf encoding of message and chain,
//!   base64-wrapped for the JSON API
//! - **Signed sessions**: `connect` authentication with one transparent
//!   re-authentication and replay on `sign_error`
//! - **Delivery modes**: single client, client list, and app-wide broadcast
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use getui_push::{GetuiConfig, GetuiPush, PushMessage};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GetuiConfig::from_env()?;
//!     let push = GetuiPush::new(config)?;
//!
//!     let message = PushMessage::notify("Hi", "Hello").payload("p1");
//!     push.push("client-id", &message).await?;
//!
//!     push.push(vec!["a", "b"], &message).await?;
//!     push.push_all(&PushMessage::transmission("sync")).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Inspecting an envelope
//!
//! ```
//! use getui_push::{MessageEncoder, PushMessage};
//!
//! let encoder = MessageEncoder::new();
//! let envelope = encoder
//!     .encode(&PushMessage::notify("Hi", "Hello"), "app-key", "app-id")
//!     .unwrap();
//!
//! let chain = encoder.decode_chain(&envelope).unwrap();
//! assert_eq!(chain.ids(), vec![1, 10000, 10010, 10030, 100]);
//! ```

pub mod auth;
pub mod chain;
mod client;
mod config;
mod encoder;
mod error;
mod message;
pub mod request;
pub mod schema;
mod service;
mod transport;

pub use auth::AuthSession;
pub use chain::{ActionBody, ActionChain, ActionNode, ActionType};
pub use client::AuthenticatingClient;
pub use config::{DEFAULT_ENDPOINT, GetuiConfig};
pub use encoder::MessageEncoder;
pub use error::{PushError, Result};
pub use message::{MessageBody, MessageKind, PushInfo, PushMessage};
pub use schema::{ProstSchema, WireSchema};
pub use service::{GetuiPush, Target};
pub use transport::{GatewayReply, HttpTransport, SIGN_ERROR, Transport};

/// Prelude for common imports.
///
/// ```
/// use getui_push::prelude::*;
/// ```
pub mod prelude {
    pub use crate::chain::{ActionChain, ActionNode};
    pub use crate::config::GetuiConfig;
    pub use crate::error::{PushError, Result};
    pub use crate::message::{MessageKind, PushInfo, PushMessage};
    pub use crate::service::{GetuiPush, Target};
    pub use crate::transport::{GatewayReply, Transport};
}
