//! Transparent envelope encoding.
//!
//! The envelope is the base64 form of the binary `Transparent` message. It is
//! built in two passes: the outer structure is serialized and parsed back
//! first, then every chain node is serialized, parsed back, checked, and
//! written into its slot before the final serialization.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use once_cell::unsync::OnceCell;
use tracing::trace;

use crate::chain::{ActionChain, ActionNode, DEFAULT_LOGO};
use crate::schema::{ProstSchema, WireSchema, chain_from_records, pb};
use crate::{MessageKind, PushError, PushInfo, PushMessage, Result};

/// Action name carried by every envelope.
pub const ENVELOPE_ACTION: &str = "pushmessage";

/// Transmission type of data messages.
pub const TRANSMISSION_TYPE: i32 = 1;

/// Builds base64 envelopes from push messages.
#[derive(Debug, Clone, Default)]
pub struct MessageEncoder<S = ProstSchema> {
    schema: S,
}

impl MessageEncoder<ProstSchema> {
    /// Create an encoder using the protobuf schema.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: WireSchema> MessageEncoder<S> {
    /// Create an encoder with a specific schema implementation.
    pub fn with_schema(schema: S) -> Self {
        Self { schema }
    }

    /// Get the schema.
    pub fn schema(&self) -> &S {
        &self.schema
    }

    /// Encode a message into a base64 envelope.
    pub fn encode(&self, message: &PushMessage, app_key: &str, app_id: &str) -> Result<String> {
        message.validate()?;

        let template = Template::new(message, app_key, app_id);
        let outer = template.transparent();

        let buffer = self.schema.encode_transparent(&outer)?;
        let mut envelope = self.schema.decode_transparent(&buffer)?;

        let kind = message.kind();
        let chain = ActionChain::build(&kind, message.body.title(), message.body.text());
        chain.validate()?;

        envelope.action_chain.clear();
        envelope.action_chain.reserve(chain.len());
        for node in chain.nodes() {
            envelope.action_chain.push(self.conform(node)?);
        }

        let bytes = self.schema.encode_transparent(&envelope)?;
        trace!(
            push_type = %kind,
            nodes = chain.len(),
            bytes = bytes.len(),
            "Encoded transparent envelope"
        );

        Ok(STANDARD.encode(bytes))
    }

    /// Decode a base64 envelope.
    pub fn decode(&self, envelope: &str) -> Result<pb::Transparent> {
        let bytes = STANDARD
            .decode(envelope)
            .map_err(|e| PushError::Schema(format!("envelope is not base64: {}", e)))?;
        self.schema.decode_transparent(&bytes)
    }

    /// Decode the action chain of a base64 envelope.
    pub fn decode_chain(&self, envelope: &str) -> Result<ActionChain> {
        let transparent = self.decode(envelope)?;
        chain_from_records(&transparent.action_chain)
    }

    /// Pass a node through the node schema and make sure nothing was lost.
    fn conform(&self, node: &ActionNode) -> Result<pb::ActionChain> {
        let bytes = self.schema.encode_action(&pb::ActionChain::from(node))?;
        let record = self.schema.decode_action(&bytes)?;

        if ActionNode::try_from(&record)? != *node {
            return Err(PushError::Schema(format!(
                "node {} does not conform to the action chain schema",
                node.id
            )));
        }

        Ok(record)
    }
}

/// Per-message view used to assemble the outer structure.
struct Template<'a> {
    message: &'a PushMessage,
    app_key: &'a str,
    app_id: &'a str,
    push_info: OnceCell<pb::PushInfo>,
}

impl<'a> Template<'a> {
    fn new(message: &'a PushMessage, app_key: &'a str, app_id: &'a str) -> Self {
        Self {
            message,
            app_key,
            app_id,
            push_info: OnceCell::new(),
        }
    }

    fn push_info(&self) -> &pb::PushInfo {
        self.push_info.get_or_init(|| match &self.message.push_info {
            Some(info) => info.into(),
            None => (&PushInfo::default()).into(),
        })
    }

    fn transparent(&self) -> pb::Transparent {
        let kind = self.message.kind();
        let mut outer = pb::Transparent {
            id: String::new(),
            action: ENVELOPE_ACTION.to_string(),
            task_id: String::new(),
            app_key: self.app_key.to_string(),
            app_id: self.app_id.to_string(),
            message_id: String::new(),
            push_info: Some(self.push_info().clone()),
            push_type: Some(kind.as_str().to_string()),
            ..Default::default()
        };

        if kind != MessageKind::Notify {
            let text = self.message.body.text().to_string();
            outer.is_ring = Some(true);
            outer.is_vibrate = Some(true);
            outer.logo = Some(DEFAULT_LOGO.to_string());
            outer.title = Some(self.message.body.title().to_string());
            outer.transmission_type = Some(TRANSMISSION_TYPE);
            outer.transmission_content = Some(text.clone());
            outer.text = Some(text);
        }

        outer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{ActionBody, NOTIFICATION_ID};

    fn notify() -> PushMessage {
        PushMessage::notify("Hi", "Hello").payload("p1")
    }

    #[test]
    fn test_encode_is_deterministic() {
        let encoder = MessageEncoder::new();
        let first = encoder.encode(&notify(), "key", "app").unwrap();
        let second = encoder.encode(&notify(), "key", "app").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_notify_envelope_round_trip() {
        let encoder = MessageEncoder::new();
        let envelope = encoder.encode(&notify(), "key", "app").unwrap();

        let chain = encoder.decode_chain(&envelope).unwrap();
        assert_eq!(chain, ActionChain::build(&MessageKind::Notify, "Hi", "Hello"));

        match &chain.get(NOTIFICATION_ID).unwrap().body {
            ActionBody::ShowNotification(action) => {
                assert_eq!(action.title, "Hi");
                assert_eq!(action.text, "Hello");
            }
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[test]
    fn test_notify_shape() {
        let encoder = MessageEncoder::new();
        let envelope = encoder.encode(&notify(), "key", "app").unwrap();
        let outer = encoder.decode(&envelope).unwrap();

        assert_eq!(outer.app_key, "key");
        assert_eq!(outer.app_id, "app");
        assert_eq!(outer.action, "pushmessage");
        assert_eq!(outer.push_type.as_deref(), Some("NotifyMsg"));
        assert!(outer.id.is_empty() && outer.task_id.is_empty() && outer.message_id.is_empty());
        assert_eq!(outer.transmission_content, None);
        assert_eq!(outer.transmission_type, None);
        assert_eq!(outer.is_ring, None);
    }

    #[test]
    fn test_transmission_shape() {
        let encoder = MessageEncoder::new();
        let message = PushMessage::transmission("data").title("t");
        let envelope = encoder.encode(&message, "key", "app").unwrap();
        let outer = encoder.decode(&envelope).unwrap();

        assert_eq!(outer.push_type.as_deref(), Some("TransmissionMsg"));
        assert_eq!(outer.transmission_type, Some(1));
        assert_eq!(outer.transmission_content.as_deref(), Some("data"));
        assert_eq!(outer.text.as_deref(), Some("data"));
        assert_eq!(outer.title.as_deref(), Some("t"));
        assert_eq!(outer.logo.as_deref(), Some("icon.png"));
        assert_eq!(outer.is_ring, Some(true));
        assert_eq!(outer.is_vibrate, Some(true));
        assert_eq!(encoder.decode_chain(&envelope).unwrap().ids(), vec![1, 10030, 100]);
    }

    #[test]
    fn test_push_info_defaulted() {
        let encoder = MessageEncoder::new();
        let envelope = encoder.encode(&notify(), "key", "app").unwrap();
        let info = encoder.decode(&envelope).unwrap().push_info.unwrap();

        assert_eq!(info.message.as_deref(), Some(""));
        assert_eq!(info.badge.as_deref(), Some(""));
        assert_eq!(info.sound.as_deref(), Some(""));
        assert_eq!(info.action_loc_key.as_deref(), Some(""));
    }

    #[test]
    fn test_push_info_supplied() {
        let encoder = MessageEncoder::new();
        let message = notify().push_info(PushInfo::new().badge("3").sound("ding"));
        let envelope = encoder.encode(&message, "key", "app").unwrap();
        let info = encoder.decode(&envelope).unwrap().push_info.unwrap();

        assert_eq!(info.badge.as_deref(), Some("3"));
        assert_eq!(info.sound.as_deref(), Some("ding"));
    }

    #[test]
    fn test_rejects_untitled_notification() {
        let encoder = MessageEncoder::new();
        let result = encoder.encode(&PushMessage::notify("", "Hello"), "key", "app");
        assert!(matches!(result, Err(PushError::InvalidMessage(_))));
    }

    #[test]
    fn test_invalid_base64() {
        let encoder = MessageEncoder::new();
        assert!(matches!(encoder.decode("not base64!"), Err(PushError::Schema(_))));
    }

    /// Drops the notification text, as a stale descriptor would.
    struct LossySchema;

    impl WireSchema for LossySchema {
        fn encode_transparent(&self, message: &pb::Transparent) -> Result<Vec<u8>> {
            ProstSchema.encode_transparent(message)
        }

        fn decode_transparent(&self, bytes: &[u8]) -> Result<pb::Transparent> {
            ProstSchema.decode_transparent(bytes)
        }

        fn encode_action(&self, node: &pb::ActionChain) -> Result<Vec<u8>> {
            let mut node = node.clone();
            if node.text.is_some() {
                node.text = Some(String::new());
            }
            ProstSchema.encode_action(&node)
        }

        fn decode_action(&self, bytes: &[u8]) -> Result<pb::ActionChain> {
            ProstSchema.decode_action(bytes)
        }
    }

    #[test]
    fn test_nonconforming_node_is_fatal() {
        let encoder = MessageEncoder::with_schema(LossySchema);
        let err = encoder.encode(&notify(), "key", "app").unwrap_err();
        assert!(err.is_fatal());

        // Transmission chains carry no text and still encode.
        let message = PushMessage::transmission("data");
        assert!(encoder.encode(&message, "key", "app").is_ok());
    }

    /// Refuses to load, as with a missing descriptor.
    struct MissingSchema;

    impl WireSchema for MissingSchema {
        fn encode_transparent(&self, _: &pb::Transparent) -> Result<Vec<u8>> {
            Err(PushError::Schema("descriptor not loaded".to_string()))
        }

        fn decode_transparent(&self, _: &[u8]) -> Result<pb::Transparent> {
            Err(PushError::Schema("descriptor not loaded".to_string()))
        }

        fn encode_action(&self, _: &pb::ActionChain) -> Result<Vec<u8>> {
            Err(PushError::Schema("descriptor not loaded".to_string()))
        }

        fn decode_action(&self, _: &[u8]) -> Result<pb::ActionChain> {
            Err(PushError::Schema("descriptor not loaded".to_string()))
        }
    }

    #[test]
    fn test_missing_schema_aborts() {
        let encoder = MessageEncoder::with_schema(MissingSchema);
        let result = encoder.encode(&notify(), "key", "app");
        assert!(matches!(result, Err(PushError::Schema(_))));
    }
}
