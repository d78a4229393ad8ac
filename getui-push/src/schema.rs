//! Binary schema of the transparent envelope.
//!
//! The message layouts are a fixed contract with the gateway vendor. Encoding
//! goes through [`WireSchema`] so the chain and envelope logic never touch the
//! serializer directly.

use crate::chain::{
    ActionBody, ActionChain, ActionNode, ActionType, AppStartIds, AppStartupAction,
    NotificationAction,
};
use crate::{PushError, PushInfo, Result};

/// Generated-style message types of the vendor schema.
pub mod pb {
    /// Outer envelope.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Transparent {
        #[prost(string, required, tag = "1")]
        pub id: String,
        #[prost(string, required, tag = "2")]
        pub action: String,
        #[prost(string, required, tag = "3")]
        pub task_id: String,
        #[prost(string, required, tag = "4")]
        pub app_key: String,
        #[prost(string, required, tag = "5")]
        pub app_id: String,
        #[prost(string, required, tag = "6")]
        pub message_id: String,
        #[prost(message, optional, tag = "7")]
        pub push_info: Option<PushInfo>,
        #[prost(message, repeated, tag = "8")]
        pub action_chain: Vec<ActionChain>,
        #[prost(string, optional, tag = "9")]
        pub push_type: Option<String>,
        #[prost(bool, optional, tag = "10")]
        pub is_ring: Option<bool>,
        #[prost(bool, optional, tag = "11")]
        pub is_vibrate: Option<bool>,
        #[prost(string, optional, tag = "12")]
        pub logo: Option<String>,
        #[prost(string, optional, tag = "13")]
        pub text: Option<String>,
        #[prost(string, optional, tag = "14")]
        pub title: Option<String>,
        #[prost(int32, optional, tag = "15")]
        pub transmission_type: Option<i32>,
        #[prost(string, optional, tag = "16")]
        pub transmission_content: Option<String>,
    }

    /// Push detail record.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct PushInfo {
        #[prost(string, optional, tag = "1")]
        pub message: Option<String>,
        #[prost(string, optional, tag = "2")]
        pub action_key: Option<String>,
        #[prost(string, optional, tag = "3")]
        pub sound: Option<String>,
        #[prost(string, optional, tag = "4")]
        pub badge: Option<String>,
        #[prost(string, optional, tag = "5")]
        pub payload: Option<String>,
        #[prost(string, optional, tag = "6")]
        pub loc_key: Option<String>,
        #[prost(string, optional, tag = "7")]
        pub loc_args: Option<String>,
        #[prost(string, optional, tag = "8")]
        pub action_loc_key: Option<String>,
        #[prost(string, optional, tag = "9")]
        pub launch_image: Option<String>,
    }

    /// Per-platform start ids.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct AppStartUp {
        #[prost(string, optional, tag = "1")]
        pub android: Option<String>,
        #[prost(string, optional, tag = "2")]
        pub symbia: Option<String>,
        #[prost(string, optional, tag = "3")]
        pub ios: Option<String>,
    }

    /// One action chain node.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ActionChain {
        #[prost(int32, required, tag = "1")]
        pub action_id: i32,
        #[prost(int32, required, tag = "2")]
        pub r#type: i32,
        #[prost(int32, optional, tag = "3")]
        pub next: Option<i32>,
        #[prost(string, optional, tag = "100")]
        pub logo: Option<String>,
        #[prost(string, optional, tag = "101")]
        pub logo_url: Option<String>,
        #[prost(string, optional, tag = "102")]
        pub title: Option<String>,
        #[prost(string, optional, tag = "103")]
        pub text: Option<String>,
        #[prost(bool, optional, tag = "104")]
        pub clearable: Option<bool>,
        #[prost(bool, optional, tag = "105")]
        pub ring: Option<bool>,
        #[prost(bool, optional, tag = "106")]
        pub buzz: Option<bool>,
        #[prost(string, optional, tag = "140")]
        pub appid: Option<String>,
        #[prost(message, optional, tag = "141")]
        pub appstartupid: Option<AppStartUp>,
        #[prost(bool, optional, tag = "142")]
        pub autostart: Option<bool>,
        #[prost(int32, optional, tag = "143")]
        pub failed_action: Option<i32>,
    }
}

/// Encoder/decoder for the envelope message types.
pub trait WireSchema: Send + Sync {
    /// Serialize an envelope.
    fn encode_transparent(&self, message: &pb::Transparent) -> Result<Vec<u8>>;

    /// Parse an envelope.
    fn decode_transparent(&self, bytes: &[u8]) -> Result<pb::Transparent>;

    /// Serialize a chain node.
    fn encode_action(&self, node: &pb::ActionChain) -> Result<Vec<u8>>;

    /// Parse a chain node.
    fn decode_action(&self, bytes: &[u8]) -> Result<pb::ActionChain>;
}

/// Protobuf implementation of the vendor schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProstSchema;

impl WireSchema for ProstSchema {
    fn encode_transparent(&self, message: &pb::Transparent) -> Result<Vec<u8>> {
        encode(message)
    }

    fn decode_transparent(&self, bytes: &[u8]) -> Result<pb::Transparent> {
        Ok(<pb::Transparent as prost::Message>::decode(bytes)?)
    }

    fn encode_action(&self, node: &pb::ActionChain) -> Result<Vec<u8>> {
        encode(node)
    }

    fn decode_action(&self, bytes: &[u8]) -> Result<pb::ActionChain> {
        Ok(<pb::ActionChain as prost::Message>::decode(bytes)?)
    }
}

fn encode<M: prost::Message>(message: &M) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(message.encoded_len());
    message.encode(&mut buf)?;
    Ok(buf)
}

impl From<&PushInfo> for pb::PushInfo {
    fn from(info: &PushInfo) -> Self {
        Self {
            message: Some(info.message.clone()),
            action_key: Some(info.action_key.clone()),
            sound: Some(info.sound.clone()),
            badge: Some(info.badge.clone()),
            payload: Some(info.payload.clone()),
            loc_key: Some(info.loc_key.clone()),
            loc_args: Some(info.loc_args.clone()),
            action_loc_key: Some(info.action_loc_key.clone()),
            launch_image: Some(info.launch_image.clone()),
        }
    }
}

impl From<&ActionNode> for pb::ActionChain {
    fn from(node: &ActionNode) -> Self {
        let mut record = pb::ActionChain {
            action_id: node.id,
            r#type: node.action_type().wire_code(),
            next: node.next,
            ..Default::default()
        };

        match &node.body {
            ActionBody::ShowNotification(action) => {
                record.title = Some(action.title.clone());
                record.text = Some(action.text.clone());
                record.logo = Some(action.logo.clone());
                record.logo_url = Some(action.logo_url.clone());
                record.ring = Some(action.ring);
                record.clearable = Some(action.clearable);
                record.buzz = Some(action.buzz);
            }
            ActionBody::AppStartup(action) => {
                record.appid = Some(action.app_id.clone());
                record.autostart = Some(action.autostart);
                record.appstartupid = Some(pb::AppStartUp {
                    android: Some(action.start_ids.android.clone()),
                    symbia: Some(action.start_ids.symbia.clone()),
                    ios: Some(action.start_ids.ios.clone()),
                });
                record.failed_action = Some(action.failed_action);
            }
            ActionBody::Start | ActionBody::Goto | ActionBody::End => {}
        }

        record
    }
}

impl TryFrom<&pb::ActionChain> for ActionNode {
    type Error = PushError;

    fn try_from(record: &pb::ActionChain) -> Result<Self> {
        let id = record.action_id;
        let action_type = ActionType::from_wire(record.r#type, id).ok_or_else(|| {
            PushError::Schema(format!("node {} has unknown type {}", id, record.r#type))
        })?;

        let body = match action_type {
            ActionType::Start => ActionBody::Start,
            ActionType::Goto => ActionBody::Goto,
            ActionType::End => ActionBody::End,
            ActionType::ShowNotification => ActionBody::ShowNotification(NotificationAction {
                title: required(&record.title, id, "title")?,
                text: required(&record.text, id, "text")?,
                logo: record.logo.clone().unwrap_or_default(),
                logo_url: record.logo_url.clone().unwrap_or_default(),
                ring: record.ring.unwrap_or_default(),
                clearable: record.clearable.unwrap_or_default(),
                buzz: record.buzz.unwrap_or_default(),
            }),
            ActionType::AppStartup => {
                let start_ids = record.appstartupid.as_ref().ok_or_else(|| {
                    PushError::Schema(format!("node {} is missing appstartupid", id))
                })?;
                ActionBody::AppStartup(AppStartupAction {
                    app_id: record.appid.clone().unwrap_or_default(),
                    autostart: record.autostart.unwrap_or_default(),
                    start_ids: AppStartIds {
                        android: start_ids.android.clone().unwrap_or_default(),
                        symbia: start_ids.symbia.clone().unwrap_or_default(),
                        ios: start_ids.ios.clone().unwrap_or_default(),
                    },
                    failed_action: record.failed_action.unwrap_or_default(),
                })
            }
        };

        Ok(ActionNode {
            id,
            next: record.next,
            body,
        })
    }
}

fn required(field: &Option<String>, id: i32, name: &str) -> Result<String> {
    field
        .clone()
        .ok_or_else(|| PushError::Schema(format!("node {} is missing {}", id, name)))
}

/// Rebuild a chain from the decoded slots of an envelope.
pub fn chain_from_records(records: &[pb::ActionChain]) -> Result<ActionChain> {
    let nodes = records
        .iter()
        .map(ActionNode::try_from)
        .collect::<Result<Vec<_>>>()?;
    Ok(ActionChain::from_nodes(nodes))
}
