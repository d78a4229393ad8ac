//! Action chains: the device-side state machine attached to every message.
//!
//! A chain is a list of nodes linked by `next` ids. The device starts at node
//! `1` and follows the links until it reaches the end node `100`. The ids are
//! dispatch keys for the device interpreter, so the templates below use the
//! gateway's fixed values.

use std::collections::HashSet;

use crate::{MessageKind, PushError, Result};

/// Id of the start node.
pub const START_ID: i32 = 1;
/// Id of the show-notification node.
pub const NOTIFICATION_ID: i32 = 10000;
/// Id of the goto node following a notification.
pub const GOTO_ID: i32 = 10010;
/// Id of the app-startup node.
pub const APP_STARTUP_ID: i32 = 10030;
/// Id of the terminal node.
pub const END_ID: i32 = 100;

/// Logo shown with notifications.
pub const DEFAULT_LOGO: &str = "icon.png";

/// Node type, as understood by the device interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionType {
    /// Entry point.
    Start,
    /// Show a notification.
    ShowNotification,
    /// Unconditional jump.
    Goto,
    /// Launch the application.
    AppStartup,
    /// Terminal node.
    End,
}

impl ActionType {
    /// Get the type code written to the wire.
    ///
    /// Start and goto share code `0`; they are told apart by id.
    pub fn wire_code(self) -> i32 {
        match self {
            Self::Start | Self::Goto => 0,
            Self::ShowNotification => 1,
            Self::AppStartup => 3,
            Self::End => 7,
        }
    }

    /// Resolve a wire type code for the node with the given id.
    pub fn from_wire(code: i32, id: i32) -> Option<Self> {
        match code {
            0 if id == START_ID => Some(Self::Start),
            0 => Some(Self::Goto),
            1 => Some(Self::ShowNotification),
            3 => Some(Self::AppStartup),
            7 => Some(Self::End),
            _ => None,
        }
    }
}

/// Parameters of a show-notification node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationAction {
    /// Title.
    pub title: String,
    /// Text.
    pub text: String,
    /// Logo file name.
    pub logo: String,
    /// Logo URL.
    pub logo_url: String,
    /// Play a sound.
    pub ring: bool,
    /// Allow the user to dismiss.
    pub clearable: bool,
    /// Vibrate.
    pub buzz: bool,
}

impl NotificationAction {
    /// Create notification parameters with the gateway defaults.
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            logo: DEFAULT_LOGO.to_string(),
            logo_url: String::new(),
            ring: true,
            clearable: true,
            buzz: true,
        }
    }
}

/// Per-platform start ids of an app-startup node.
///
/// Always sent, always empty: platform targeting is not used by this client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppStartIds {
    /// Android start id.
    pub android: String,
    /// Symbian start id.
    pub symbia: String,
    /// iOS start id.
    pub ios: String,
}

/// Parameters of an app-startup node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppStartupAction {
    /// Application id to start.
    pub app_id: String,
    /// Start the application automatically.
    pub autostart: bool,
    /// Platform start ids.
    pub start_ids: AppStartIds,
    /// Node to jump to when startup fails.
    pub failed_action: i32,
}

impl Default for AppStartupAction {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            autostart: true,
            start_ids: AppStartIds::default(),
            failed_action: END_ID,
        }
    }
}

/// Type-specific node content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionBody {
    /// Entry point.
    Start,
    /// Show a notification.
    ShowNotification(NotificationAction),
    /// Unconditional jump.
    Goto,
    /// Launch the application.
    AppStartup(AppStartupAction),
    /// Terminal node.
    End,
}

/// A node of an action chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionNode {
    /// Link key, unique within the chain.
    pub id: i32,
    /// Id of the following node. `None` only on the end node.
    pub next: Option<i32>,
    /// Type-specific content.
    pub body: ActionBody,
}

impl ActionNode {
    /// Create the start node.
    pub fn start(next: i32) -> Self {
        Self {
            id: START_ID,
            next: Some(next),
            body: ActionBody::Start,
        }
    }

    /// Create the end node.
    pub fn end() -> Self {
        Self {
            id: END_ID,
            next: None,
            body: ActionBody::End,
        }
    }

    /// Get the node type.
    pub fn action_type(&self) -> ActionType {
        match self.body {
            ActionBody::Start => ActionType::Start,
            ActionBody::ShowNotification(_) => ActionType::ShowNotification,
            ActionBody::Goto => ActionType::Goto,
            ActionBody::AppStartup(_) => ActionType::AppStartup,
            ActionBody::End => ActionType::End,
        }
    }
}

/// Ordered action chain for one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionChain {
    nodes: Vec<ActionNode>,
}

impl ActionChain {
    /// Build the chain for a push type.
    ///
    /// Title and text only matter for notifications. Unknown push types get an
    /// empty chain.
    pub fn build(kind: &MessageKind, title: &str, text: &str) -> Self {
        match kind {
            MessageKind::Notify => Self::notification(title, text),
            MessageKind::Transmission => Self::transmission(),
            MessageKind::Other(_) => Self::default(),
        }
    }

    /// Chain that shows a notification, then starts the app.
    pub fn notification(title: &str, text: &str) -> Self {
        Self::from_nodes(vec![
            ActionNode::start(NOTIFICATION_ID),
            ActionNode {
                id: NOTIFICATION_ID,
                next: Some(GOTO_ID),
                body: ActionBody::ShowNotification(NotificationAction::new(title, text)),
            },
            ActionNode {
                id: GOTO_ID,
                next: Some(APP_STARTUP_ID),
                body: ActionBody::Goto,
            },
            app_startup(),
            ActionNode::end(),
        ])
    }

    /// Chain that silently starts the app.
    pub fn transmission() -> Self {
        Self::from_nodes(vec![
            ActionNode::start(APP_STARTUP_ID),
            app_startup(),
            ActionNode::end(),
        ])
    }

    /// Wrap nodes without checking them. See [`ActionChain::validate`].
    pub fn from_nodes(nodes: Vec<ActionNode>) -> Self {
        Self { nodes }
    }

    /// Get the nodes in chain order.
    pub fn nodes(&self) -> &[ActionNode] {
        &self.nodes
    }

    /// Get the node ids in chain order.
    pub fn ids(&self) -> Vec<i32> {
        self.nodes.iter().map(|n| n.id).collect()
    }

    /// Find a node by id.
    pub fn get(&self, id: i32) -> Option<&ActionNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check whether the chain has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Check the linking invariant.
    ///
    /// A non-empty chain starts with the start node, has unique ids, and
    /// walking `next` from the start visits every node in list order and stops
    /// at the single end node, whose id is `END_ID`. The empty chain is valid.
    pub fn validate(&self) -> Result<()> {
        let Some(first) = self.nodes.first() else {
            return Ok(());
        };

        if first.id != START_ID || first.action_type() != ActionType::Start {
            return Err(PushError::InvalidChain(format!(
                "chain must begin with start node {}, found {}",
                START_ID, first.id
            )));
        }

        let mut ids = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !ids.insert(node.id) {
                return Err(PushError::InvalidChain(format!("duplicate node id {}", node.id)));
            }
        }

        let ends = self
            .nodes
            .iter()
            .filter(|n| n.action_type() == ActionType::End)
            .count();
        if ends != 1 {
            return Err(PushError::InvalidChain(format!(
                "expected exactly one end node, found {}",
                ends
            )));
        }

        for (position, node) in self.nodes.iter().enumerate() {
            match (node.action_type(), node.next) {
                (ActionType::End, None) => {
                    if node.id != END_ID {
                        return Err(PushError::InvalidChain(format!(
                            "end node has id {}, expected {}",
                            node.id, END_ID
                        )));
                    }
                    if position + 1 != self.nodes.len() {
                        return Err(PushError::InvalidChain(format!(
                            "end node {} is not last",
                            node.id
                        )));
                    }
                }
                (ActionType::End, Some(next)) => {
                    return Err(PushError::InvalidChain(format!(
                        "end node {} links to {}",
                        node.id, next
                    )));
                }
                (_, None) => {
                    return Err(PushError::InvalidChain(format!(
                        "node {} has no successor",
                        node.id
                    )));
                }
                (_, Some(next)) => {
                    if !ids.contains(&next) {
                        return Err(PushError::InvalidChain(format!(
                            "node {} links to unknown node {}",
                            node.id, next
                        )));
                    }
                    let expected = self.nodes.get(position + 1).map(|n| n.id);
                    if expected != Some(next) {
                        return Err(PushError::InvalidChain(format!(
                            "node {} links to {} out of order",
                            node.id, next
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

fn app_startup() -> ActionNode {
    ActionNode {
        id: APP_STARTUP_ID,
        next: Some(END_ID),
        body: ActionBody::AppStartup(AppStartupAction::default()),
    }
}
