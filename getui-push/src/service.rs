//! Push operations: single, list, and broadcast.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::auth::AuthSession;
use crate::client::AuthenticatingClient;
use crate::encoder::MessageEncoder;
use crate::request::{
    AppRequest, BroadcastScope, ContentIdRequest, ListRequest, ListTarget, MessageStructure,
    PROTOCOL_VERSION, SingleRequest, action,
};
use crate::schema::{ProstSchema, WireSchema};
use crate::transport::{HttpTransport, Transport};
use crate::{GetuiConfig, PushError, PushMessage, Result};

/// Who receives a push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// One client id.
    Single(String),
    /// Several client ids, sent through a content id.
    List(Vec<String>),
}

impl From<&str> for Target {
    fn from(token: &str) -> Self {
        Self::Single(token.to_string())
    }
}

impl From<String> for Target {
    fn from(token: String) -> Self {
        Self::Single(token)
    }
}

impl From<Vec<String>> for Target {
    fn from(tokens: Vec<String>) -> Self {
        Self::List(tokens)
    }
}

impl From<Vec<&str>> for Target {
    fn from(tokens: Vec<&str>) -> Self {
        Self::List(tokens.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Target {
    fn from(tokens: &[&str]) -> Self {
        Self::List(tokens.iter().map(|t| t.to_string()).collect())
    }
}

/// Getui push service.
pub struct GetuiPush<T = HttpTransport, S = ProstSchema> {
    config: GetuiConfig,
    client: AuthenticatingClient<T>,
    encoder: MessageEncoder<S>,
}

impl GetuiPush<HttpTransport, ProstSchema> {
    /// Create a service talking HTTP to the configured endpoint.
    pub fn new(config: GetuiConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> GetuiPush<T, ProstSchema> {
    /// Create a service over a custom transport.
    pub fn with_transport(config: GetuiConfig, transport: T) -> Self {
        Self::with_parts(config, transport, MessageEncoder::new())
    }
}

impl<T: Transport, S: WireSchema> GetuiPush<T, S> {
    /// Create a service from its parts.
    pub fn with_parts(config: GetuiConfig, transport: T, encoder: MessageEncoder<S>) -> Self {
        let client = AuthenticatingClient::new(
            transport,
            config.app_key.clone(),
            config.master_secret.clone(),
        );
        Self {
            config,
            client,
            encoder,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &GetuiConfig {
        &self.config
    }

    /// Get the authenticating client.
    pub fn client(&self) -> &AuthenticatingClient<T> {
        &self.client
    }

    /// Get the encoder.
    pub fn encoder(&self) -> &MessageEncoder<S> {
        &self.encoder
    }

    /// Authenticate explicitly, replacing any current session.
    pub async fn auth(&self) -> Result<AuthSession> {
        self.client.authenticate().await
    }

    /// Push to one client or a list, depending on the target.
    pub async fn push(&self, target: impl Into<Target>, message: &PushMessage) -> Result<Value> {
        match target.into() {
            Target::Single(token) => self.push_one(&token, message).await,
            Target::List(tokens) => self.push_list(tokens.as_slice(), message).await,
        }
    }

    /// Push to a single client.
    pub async fn push_one(&self, token: &str, message: &PushMessage) -> Result<Value> {
        let request = SingleRequest {
            message: self.structure(message)?,
            app_id: self.config.app_id.clone(),
            transmission_content: message.payload.clone(),
            action: action::PUSH_SINGLE,
            client_id: token.to_string(),
        };

        debug!(client_id = %token, push_type = %message.kind(), "Pushing to single client");
        self.send(&request).await
    }

    /// Push to a list of clients.
    ///
    /// Uploads the content first, then sends the list push for the returned
    /// content id.
    pub async fn push_list<K: AsRef<str>>(
        &self,
        tokens: &[K],
        message: &PushMessage,
    ) -> Result<Value> {
        if tokens.is_empty() {
            return Err(PushError::InvalidMessage("target list is empty".to_string()));
        }

        let content_id = self.content_id(message, None).await?;

        let request = ListRequest {
            appkey: self.config.app_key.clone(),
            content_id,
            need_details: "true",
            version: PROTOCOL_VERSION,
            action: action::PUSH_LIST,
            kind: 2,
            target_list: tokens
                .iter()
                .map(|token| ListTarget {
                    alias: String::new(),
                    client_id: token.as_ref().to_string(),
                    app_id: self.config.app_id.clone(),
                })
                .collect(),
        };

        info!(targets = tokens.len(), "Pushing to client list");
        self.send(&request).await
    }

    /// Push to every client of the app.
    pub async fn push_all(&self, message: &PushMessage) -> Result<Value> {
        let scope = BroadcastScope::app(self.config.app_id.clone());
        let content_id = self.content_id(message, Some(scope)).await?;

        let request = AppRequest {
            appkey: self.config.app_key.clone(),
            content_id,
            version: PROTOCOL_VERSION,
            action: action::PUSH_APP,
            kind: 2,
        };

        info!(app_id = %self.config.app_id, "Broadcasting to app");
        self.send(&request).await
    }

    /// Upload content and return its id.
    async fn content_id(
        &self,
        message: &PushMessage,
        broadcast: Option<BroadcastScope>,
    ) -> Result<String> {
        let request = ContentIdRequest {
            message: self.structure(message)?,
            transmission_content: message.payload.clone(),
            action: action::GET_CONTENT_ID,
            task_group_name: String::new(),
            broadcast,
        };

        let body = self.send(&request).await?;
        let content_id = body
            .get("contentId")
            .and_then(Value::as_str)
            .ok_or_else(|| PushError::UnexpectedResponse(format!("no contentId in {}", body)))?;

        debug!(content_id, "Obtained content id");
        Ok(content_id.to_string())
    }

    fn structure(&self, message: &PushMessage) -> Result<MessageStructure> {
        let envelope = self
            .encoder
            .encode(message, &self.config.app_key, &self.config.app_id)?;
        Ok(MessageStructure::new(
            self.config.app_key.clone(),
            message.kind().as_str(),
            envelope,
        ))
    }

    async fn send<R: Serialize>(&self, request: &R) -> Result<Value> {
        let body = serde_json::to_value(request)?;
        self.client.send(&body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{ActionBody, NOTIFICATION_ID};
    use crate::client::tests::MockGateway;
    use crate::transport::GatewayReply;
    use serde_json::json;

    fn config() -> GetuiConfig {
        GetuiConfig::new("key", "app", "secret")
    }

    fn service(gateway: &MockGateway) -> GetuiPush<MockGateway> {
        GetuiPush::with_transport(config(), gateway.clone())
    }

    fn hello() -> PushMessage {
        PushMessage::notify("Hi", "Hello").payload("p1")
    }

    #[tokio::test]
    async fn test_push_single() {
        let gateway = MockGateway::new().reply(GatewayReply::ok(json!({ "result": "ok" })));
        let push = service(&gateway);

        push.push("token123", &hello()).await.unwrap();

        let sent = gateway.requests_for("pushMessageToSingleAction");
        assert_eq!(sent.len(), 1);
        let request = &sent[0];
        assert_eq!(request["clientId"], "token123");
        assert_eq!(request["appId"], "app");
        assert_eq!(request["transmissionContent"], "p1");
        assert_eq!(request["pushType"], "NotifyMsg");
        assert_eq!(request["offlineExpireTime"], 360000);

        let envelope = request["clientData"].as_str().unwrap();
        let chain = push.encoder().decode_chain(envelope).unwrap();
        assert_eq!(chain.ids(), vec![1, 10000, 10010, 10030, 100]);
        match &chain.get(NOTIFICATION_ID).unwrap().body {
            ActionBody::ShowNotification(action) => {
                assert_eq!(action.title, "Hi");
                assert_eq!(action.text, "Hello");
            }
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_push_list() {
        let gateway = MockGateway::new()
            .reply(GatewayReply::ok(json!({ "result": "ok", "contentId": "OSL-1" })))
            .reply(GatewayReply::ok(json!({ "result": "ok" })));
        let push = service(&gateway);

        push.push(vec!["a", "b"], &hello()).await.unwrap();

        let actions: Vec<Value> = gateway
            .requests
            .lock()
            .iter()
            .map(|r| r["action"].clone())
            .collect();
        assert_eq!(
            actions,
            vec![json!("connect"), json!("getContentIdAction"), json!("pushMessageToListAction")]
        );

        let upload = &gateway.requests_for("getContentIdAction")[0];
        assert_eq!(upload["taskGroupName"], "");
        assert_eq!(upload["transmissionContent"], "p1");
        assert!(upload.get("appIdList").is_none());

        let list = &gateway.requests_for("pushMessageToListAction")[0];
        assert_eq!(list["contentId"], "OSL-1");
        assert_eq!(list["needDetails"], "true");
        let targets = list["targetList"].as_array().unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0]["clientId"], "a");
        assert_eq!(targets[1]["clientId"], "b");
        assert_eq!(targets[0]["appId"], "app");
        assert_eq!(targets[0]["alias"], "");
    }

    #[tokio::test]
    async fn test_push_all() {
        let gateway = MockGateway::new()
            .reply(GatewayReply::ok(json!({ "result": "ok", "contentId": "OSA-1" })))
            .reply(GatewayReply::ok(json!({ "result": "ok" })));
        let push = service(&gateway);

        push.push_all(&PushMessage::transmission("data")).await.unwrap();

        let upload = &gateway.requests_for("getContentIdAction")[0];
        assert_eq!(upload["contentType"], 2);
        assert_eq!(upload["appIdList"], json!(["app"]));
        assert_eq!(upload["pushType"], "TransmissionMsg");

        let broadcast = &gateway.requests_for("pushMessageToAppAction")[0];
        assert_eq!(broadcast["contentId"], "OSA-1");
        assert_eq!(broadcast["type"], 2);
        assert_eq!(broadcast["appkey"], "key");
    }

    #[tokio::test]
    async fn test_missing_content_id() {
        let gateway = MockGateway::new().reply(GatewayReply::ok(json!({ "result": "ok" })));
        let push = service(&gateway);

        let err = push.push_list(&["a"], &hello()).await.unwrap_err();

        assert!(matches!(err, PushError::UnexpectedResponse(_)));
        assert!(gateway.requests_for("pushMessageToListAction").is_empty());
    }

    #[tokio::test]
    async fn test_failed_upload_stops_list_push() {
        let gateway = MockGateway::new().reply(GatewayReply::new(500, json!("error")));
        let push = service(&gateway);

        let err = push.push_list(&["a"], &hello()).await.unwrap_err();

        assert_eq!(err.status_code(), Some(500));
        assert!(gateway.requests_for("pushMessageToListAction").is_empty());
    }

    #[tokio::test]
    async fn test_empty_list_rejected() {
        let gateway = MockGateway::new();
        let push = service(&gateway);

        let tokens: Vec<String> = Vec::new();
        assert!(push.push_list(tokens.as_slice(), &hello()).await.is_err());
        assert!(gateway.requests.lock().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_message_not_sent() {
        let gateway = MockGateway::new();
        let push = service(&gateway);

        let err = push.push_one("t", &PushMessage::notify("", "x")).await.unwrap_err();

        assert!(matches!(err, PushError::InvalidMessage(_)));
        assert!(gateway.requests.lock().is_empty());
    }

    #[tokio::test]
    async fn test_sign_error_replays_list_push_step() {
        let gateway = MockGateway::new()
            .reply(GatewayReply::ok(json!({ "result": "ok", "contentId": "OSL-2" })))
            .reply(GatewayReply::ok(json!({ "result": "sign_error" })))
            .reply(GatewayReply::ok(json!({ "result": "ok" })));
        let push = service(&gateway);

        push.push_list(&["a"], &hello()).await.unwrap();

        assert_eq!(gateway.connects(), 2);
        let lists = gateway.requests_for("pushMessageToListAction");
        assert_eq!(lists.len(), 2);
        assert_eq!(lists[0], lists[1]);
    }

    #[test]
    fn test_target_conversions() {
        assert_eq!(Target::from("a"), Target::Single("a".to_string()));
        assert_eq!(
            Target::from(vec!["a", "b"]),
            Target::List(vec!["a".to_string(), "b".to_string()])
        );
    }
}
