use std::fmt::Write;

use relay_core::{DocumentView, NodeKind, NodeStatus, NodeView, RecreationState, WidgetState};

/// Plain-text rendering of the conversation, one block per node.
pub fn render(view: &DocumentView) -> String {
    let mut out = String::new();
    let conversation = view
        .conversation_id
        .map_or_else(|| "-".to_string(), |id| id.to_string());
    let _ = write!(
        out,
        "conversation {} | next {} | buffered {}",
        conversation, view.next_expected, view.buffered
    );
    if view.recreation == RecreationState::Recreating {
        out.push_str(" | rebuilding");
    }
    out.push('\n');

    for node in &view.nodes {
        let _ = writeln!(out, "{}", header(node));
        for line in node.content.lines() {
            let _ = writeln!(out, "    {line}");
        }
    }
    if let Some(thinking) = &view.thinking {
        let _ = writeln!(out, "... {thinking}");
    }
    out
}

fn header(node: &NodeView) -> String {
    let label = match node.kind {
        NodeKind::UserText => "you".to_string(),
        NodeKind::AssistantText => "assistant".to_string(),
        NodeKind::FunctionCall => "tool".to_string(),
        NodeKind::Marker => "revert point".to_string(),
        NodeKind::Command(kind) => match (&node.filename, node.language) {
            (Some(filename), Some(language)) => format!("{kind} {filename} ({language})"),
            (Some(filename), None) => format!("{kind} {filename}"),
            (None, _) => kind.to_string(),
        },
    };
    let state = match (node.widget, node.status) {
        (Some(widget), _) => format!(" [{}]", widget_label(widget)),
        (None, NodeStatus::Streaming) => " [streaming]".to_string(),
        (None, NodeStatus::Cancelled) => " [stopped]".to_string(),
        (None, NodeStatus::Complete) => String::new(),
    };
    format!("#{} {}{}", node.sequence, label, state)
}

fn widget_label(state: WidgetState) -> &'static str {
    match state {
        WidgetState::Streaming => "streaming",
        WidgetState::Queued => "queued",
        WidgetState::Active => "accept / cancel",
        WidgetState::Resolved => "done",
        WidgetState::Cancelled => "cancelled",
    }
}
