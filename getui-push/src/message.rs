//! Push message types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{PushError, Result};

/// Gateway push type.
///
/// Unknown type strings are carried verbatim in `Other`. Messages never
/// produce it; it only feeds `ActionChain::build`, which yields an empty chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageKind {
    /// User-visible notification (`NotifyMsg`).
    Notify,
    /// Silent data message (`TransmissionMsg`).
    Transmission,
    /// Any other push type.
    Other(String),
}

impl MessageKind {
    /// Get the gateway's name for this push type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Notify => "NotifyMsg",
            Self::Transmission => "TransmissionMsg",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for MessageKind {
    fn from(name: &str) -> Self {
        match name {
            "NotifyMsg" => Self::Notify,
            "TransmissionMsg" => Self::Transmission,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for MessageKind {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<MessageKind> for String {
    fn from(kind: MessageKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the device shows or receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MessageBody {
    /// Notification with a mandatory title.
    #[serde(rename = "NotifyMsg")]
    Notify {
        /// Notification title.
        title: String,
        /// Notification text.
        text: String,
    },
    /// Data message. Some platforms accept it without a title.
    #[serde(rename = "TransmissionMsg")]
    Transmission {
        /// Optional title.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        /// Message text, duplicated into the transmission content.
        text: String,
    },
}

impl MessageBody {
    /// Get the push type.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Notify { .. } => MessageKind::Notify,
            Self::Transmission { .. } => MessageKind::Transmission,
        }
    }

    /// Get the title, empty when absent.
    pub fn title(&self) -> &str {
        match self {
            Self::Notify { title, .. } => title,
            Self::Transmission { title, .. } => title.as_deref().unwrap_or_default(),
        }
    }

    /// Get the text.
    pub fn text(&self) -> &str {
        match self {
            Self::Notify { text, .. } | Self::Transmission { text, .. } => text,
        }
    }
}

/// APNs-style push detail record embedded in every envelope.
///
/// Every field defaults to an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PushInfo {
    /// Localized action key.
    pub action_loc_key: String,
    /// Action key.
    pub action_key: String,
    /// Badge value.
    pub badge: String,
    /// Alert message.
    pub message: String,
    /// Sound to play.
    pub sound: String,
    /// Custom payload.
    pub payload: String,
    /// Localization key.
    pub loc_key: String,
    /// Localization arguments.
    pub loc_args: String,
    /// Launch image.
    pub launch_image: String,
}

impl PushInfo {
    /// Create an empty push detail record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the alert message.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Set the badge.
    pub fn badge(mut self, badge: impl Into<String>) -> Self {
        self.badge = badge.into();
        self
    }

    /// Set the sound.
    pub fn sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = sound.into();
        self
    }

    /// Set the payload.
    pub fn payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = payload.into();
        self
    }
}

/// A message to push through the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    /// Content and push type.
    #[serde(flatten)]
    pub body: MessageBody,
    /// Opaque payload sent as the outer `transmissionContent`.
    #[serde(default)]
    pub payload: String,
    /// Push detail record. Defaulted when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_info: Option<PushInfo>,
}

impl PushMessage {
    /// Create a notification message.
    pub fn notify(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self::from_body(MessageBody::Notify {
            title: title.into(),
            text: text.into(),
        })
    }

    /// Create a transmission (data) message.
    pub fn transmission(text: impl Into<String>) -> Self {
        Self::from_body(MessageBody::Transmission {
            title: None,
            text: text.into(),
        })
    }

    /// Create a message from its body.
    pub fn from_body(body: MessageBody) -> Self {
        Self {
            body,
            payload: String::new(),
            push_info: None,
        }
    }

    /// Set the transmission title (ignored for notifications).
    pub fn title(mut self, value: impl Into<String>) -> Self {
        match &mut self.body {
            MessageBody::Notify { title, .. } => *title = value.into(),
            MessageBody::Transmission { title, .. } => *title = Some(value.into()),
        }
        self
    }

    /// Set the payload.
    pub fn payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Set the push detail record.
    pub fn push_info(mut self, push_info: PushInfo) -> Self {
        self.push_info = Some(push_info);
        self
    }

    /// Get the push type.
    pub fn kind(&self) -> MessageKind {
        self.body.kind()
    }

    /// Check the message can be sent.
    pub fn validate(&self) -> Result<()> {
        if let MessageBody::Notify { title, .. } = &self.body
            && title.is_empty()
        {
            return Err(PushError::InvalidMessage(
                "notification messages require a title".to_string(),
            ));
        }
        Ok(())
    }
}
