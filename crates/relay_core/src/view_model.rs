use crate::code_block::language_for_filename;
use crate::{
    CommandKind, ConversationId, Document, NodeKind, RecreationState, Sequence, WidgetState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    Streaming,
    Complete,
    Cancelled,
}

/// What the presentation layer needs to draw the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentView {
    pub conversation_id: Option<ConversationId>,
    pub recreation: RecreationState,
    pub next_expected: Sequence,
    pub buffered: usize,
    pub thinking: Option<String>,
    pub nodes: Vec<NodeView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeView {
    pub message_id: String,
    pub sequence: Sequence,
    pub kind: NodeKind,
    pub content: String,
    pub status: NodeStatus,
    pub widget: Option<WidgetState>,
    pub filename: Option<String>,
    pub language: Option<&'static str>,
}

impl NodeView {
    /// Accept/cancel controls are live.
    pub fn is_actionable(&self) -> bool {
        self.widget == Some(WidgetState::Active)
    }
}

pub(crate) fn nodes_view(document: &Document) -> Vec<NodeView> {
    document
        .nodes()
        .map(|node| {
            let status = if node.is_cancelled() {
                NodeStatus::Cancelled
            } else if node.is_terminal() {
                NodeStatus::Complete
            } else {
                NodeStatus::Streaming
            };
            let language = match node.kind() {
                NodeKind::Command(CommandKind::EditFile) => {
                    node.filename().and_then(language_for_filename)
                }
                NodeKind::Command(CommandKind::Console) => Some("r"),
                NodeKind::Command(CommandKind::Terminal) => Some("bash"),
                _ => None,
            };
            NodeView {
                message_id: node.message_id().to_owned(),
                sequence: node.sequence(),
                kind: node.kind(),
                content: node.content().to_owned(),
                status,
                widget: node.widget_state(),
                filename: node.filename().map(ToOwned::to_owned),
                language,
            }
        })
        .collect()
}
