//! Outer JSON requests of the gateway API.

use serde::Serialize;

/// Protocol version sent with every request.
pub const PROTOCOL_VERSION: &str = "3.0.0.0";

/// Offline retention of messages, in milliseconds.
pub const OFFLINE_EXPIRE_TIME: u64 = 360_000;

/// Gateway actions.
pub mod action {
    /// Authenticate.
    pub const CONNECT: &str = "connect";
    /// Push to one client.
    pub const PUSH_SINGLE: &str = "pushMessageToSingleAction";
    /// Upload content for a list or broadcast push.
    pub const GET_CONTENT_ID: &str = "getContentIdAction";
    /// Push uploaded content to a list of clients.
    pub const PUSH_LIST: &str = "pushMessageToListAction";
    /// Push uploaded content to every client of an app.
    pub const PUSH_APP: &str = "pushMessageToAppAction";
}

/// Fields shared by every request that carries an envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageStructure {
    pub appkey: String,
    pub push_type: String,
    pub client_data: String,
    pub push_net_work_type: u8,
    #[serde(rename = "type")]
    pub kind: u8,
    pub offline_expire_time: u64,
    pub version: &'static str,
    pub is_offline: &'static str,
}

impl MessageStructure {
    /// Wrap an encoded envelope.
    pub fn new(
        appkey: impl Into<String>,
        push_type: impl Into<String>,
        client_data: impl Into<String>,
    ) -> Self {
        Self {
            appkey: appkey.into(),
            push_type: push_type.into(),
            client_data: client_data.into(),
            push_net_work_type: 0,
            kind: 2,
            offline_expire_time: OFFLINE_EXPIRE_TIME,
            version: PROTOCOL_VERSION,
            is_offline: "true",
        }
    }
}

/// `pushMessageToSingleAction`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleRequest {
    #[serde(flatten)]
    pub message: MessageStructure,
    pub app_id: String,
    pub transmission_content: String,
    pub action: &'static str,
    pub client_id: String,
}

/// Targeting of a broadcast content upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastScope {
    pub content_type: u8,
    pub province_list: Vec<String>,
    pub app_id_list: Vec<String>,
    pub phone_type_list: Vec<String>,
    pub tag_list: Vec<String>,
}

impl BroadcastScope {
    /// Every device of one app.
    pub fn app(app_id: impl Into<String>) -> Self {
        Self {
            content_type: 2,
            province_list: Vec::new(),
            app_id_list: vec![app_id.into()],
            phone_type_list: Vec::new(),
            tag_list: Vec::new(),
        }
    }
}

/// `getContentIdAction`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentIdRequest {
    #[serde(flatten)]
    pub message: MessageStructure,
    pub transmission_content: String,
    pub action: &'static str,
    pub task_group_name: String,
    #[serde(flatten)]
    pub broadcast: Option<BroadcastScope>,
}

/// Entry of a list push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTarget {
    pub alias: String,
    pub client_id: String,
    pub app_id: String,
}

/// `pushMessageToListAction`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest {
    pub appkey: String,
    pub content_id: String,
    pub need_details: &'static str,
    pub version: &'static str,
    pub action: &'static str,
    #[serde(rename = "type")]
    pub kind: u8,
    pub target_list: Vec<ListTarget>,
}

/// `pushMessageToAppAction`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppRequest {
    pub appkey: String,
    pub content_id: String,
    pub version: &'static str,
    pub action: &'static str,
    #[serde(rename = "type")]
    pub kind: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn structure() -> MessageStructure {
        MessageStructure::new("key", "NotifyMsg", "ZW52")
    }

    #[test]
    fn test_message_structure_fields() {
        let value = serde_json::to_value(structure()).unwrap();

        assert_eq!(
            value,
            json!({
                "appkey": "key",
                "pushType": "NotifyMsg",
                "clientData": "ZW52",
                "pushNetWorkType": 0,
                "type": 2,
                "offlineExpireTime": 360000,
                "version": "3.0.0.0",
                "isOffline": "true"
            })
        );
    }

    #[test]
    fn test_content_id_without_scope() {
        let request = ContentIdRequest {
            message: structure(),
            transmission_content: "p1".to_string(),
            action: action::GET_CONTENT_ID,
            task_group_name: String::new(),
            broadcast: None,
        };
        let value = serde_json::to_value(request).unwrap();

        assert_eq!(value["action"], "getContentIdAction");
        assert_eq!(value["taskGroupName"], "");
        assert_eq!(value["clientData"], "ZW52");
        assert!(value.get("appIdList").is_none());
    }

    #[test]
    fn test_content_id_with_scope() {
        let request = ContentIdRequest {
            message: structure(),
            transmission_content: "p1".to_string(),
            action: action::GET_CONTENT_ID,
            task_group_name: String::new(),
            broadcast: Some(BroadcastScope::app("app")),
        };
        let value = serde_json::to_value(request).unwrap();

        assert_eq!(value["contentType"], 2);
        assert_eq!(value["appIdList"], json!(["app"]));
        assert_eq!(value["provinceList"], json!([]));
        assert_eq!(value["phoneTypeList"], json!([]));
        assert_eq!(value["tagList"], json!([]));
    }

    #[test]
    fn test_list_request_fields() {
        let request = ListRequest {
            appkey: "key".to_string(),
            content_id: "c1".to_string(),
            need_details: "true",
            version: PROTOCOL_VERSION,
            action: action::PUSH_LIST,
            kind: 2,
            target_list: vec![ListTarget {
                alias: String::new(),
                client_id: "a".to_string(),
                app_id: "app".to_string(),
            }],
        };
        let value = serde_json::to_value(request).unwrap();

        assert_eq!(value["needDetails"], "true");
        assert_eq!(value["type"], 2);
        assert_eq!(
            value["targetList"],
            json!([{ "alias": "", "clientId": "a", "appId": "app" }])
        );
    }
}
