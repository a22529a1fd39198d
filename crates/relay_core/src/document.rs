use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{CommandKind, Sequence};

pub type NodeId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    UserText,
    AssistantText,
    FunctionCall,
    Command(CommandKind),
    /// Revert point attached to a user message.
    Marker,
}

impl NodeKind {
    pub fn is_widget(self) -> bool {
        matches!(self, NodeKind::Command(_))
    }
}

/// Lifecycle of a command widget as seen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetState {
    /// Content still arriving.
    Streaming,
    /// Content complete, waiting for earlier interactions to be decided.
    Queued,
    /// Accept/cancel controls are live.
    Active,
    /// The user accepted or cancelled it.
    Resolved,
    /// The stream was cancelled before completion.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentNode {
    id: NodeId,
    message_id: String,
    sequence: Sequence,
    kind: NodeKind,
    pub(crate) content: String,
    pub(crate) terminal: bool,
    pub(crate) cancelled: bool,
    pub(crate) widget: Option<WidgetState>,
    pub(crate) filename: Option<String>,
}

impl DocumentNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// Sequence that decided the node's position. Never changes.
    pub fn sequence(&self) -> Sequence {
        self.sequence
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn widget_state(&self) -> Option<WidgetState> {
        self.widget
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }
}

/// Ordered set of nodes owned by one reconciler. Nodes live in an arena
/// keyed by id; `order` holds the visible sequence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    nodes: HashMap<NodeId, DocumentNode>,
    order: Vec<NodeId>,
    by_message: HashMap<String, NodeId>,
    markers: HashMap<String, NodeId>,
    next_id: NodeId,
    thinking: Option<String>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Nodes in display order.
    pub fn nodes(&self) -> impl Iterator<Item = &DocumentNode> + '_ {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn node(&self, message_id: &str) -> Option<&DocumentNode> {
        self.by_message
            .get(message_id)
            .and_then(|id| self.nodes.get(id))
    }

    pub fn has_marker(&self, message_id: &str) -> bool {
        self.markers.contains_key(message_id)
    }

    pub fn thinking(&self) -> Option<&str> {
        self.thinking.as_deref()
    }

    pub(crate) fn node_mut(&mut self, message_id: &str) -> Option<&mut DocumentNode> {
        let id = self.by_message.get(message_id)?;
        self.nodes.get_mut(id)
    }

    /// Inserts a node before the first node with a greater sequence, or at
    /// the end. Marker nodes are tracked apart from message nodes so a revert
    /// point can share its message id with the user message it belongs to.
    pub(crate) fn insert(
        &mut self,
        message_id: &str,
        sequence: Sequence,
        kind: NodeKind,
    ) -> &mut DocumentNode {
        let id = self.next_id;
        self.next_id += 1;

        let position = self
            .order
            .iter()
            .position(|other| {
                self.nodes
                    .get(other)
                    .is_some_and(|node| node.sequence > sequence)
            })
            .unwrap_or(self.order.len());
        self.order.insert(position, id);

        let index = if kind == NodeKind::Marker {
            &mut self.markers
        } else {
            &mut self.by_message
        };
        index.insert(message_id.to_owned(), id);

        self.nodes.entry(id).or_insert(DocumentNode {
            id,
            message_id: message_id.to_owned(),
            sequence,
            kind,
            content: String::new(),
            terminal: false,
            cancelled: false,
            widget: kind.is_widget().then_some(WidgetState::Streaming),
            filename: None,
        })
    }

    pub(crate) fn set_thinking(&mut self, text: Option<String>) {
        self.thinking = text;
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.order.clear();
        self.by_message.clear();
        self.markers.clear();
        self.thinking = None;
    }
}
