use relay_logging::{relay_debug, relay_trace, relay_warn};

use crate::code_block::strip_code_fence;
use crate::{
    CommandKind, ControlOp, Document, Effect, Event, EventKind, InteractionSerializer, NodeKind,
    PendingInteraction, WidgetState,
};

const DEFAULT_THINKING_TEXT: &str = "Thinking...";

/// Outcome of stopping a stream early.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cancellation {
    /// Content kept in the document; `None` if nothing was stopped or nothing had arrived.
    pub preserved: Option<String>,
    pub effects: Vec<Effect>,
}

/// Applies in-order events to one document and owns that document's
/// interaction queue.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentReconciler {
    document: Document,
    serializer: InteractionSerializer,
    /// Set once an assistant reply of the current turn completed successfully.
    turn_completed: bool,
    /// Building off-screen; user-facing effects are held back.
    detached: bool,
}

impl DocumentReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn detached() -> Self {
        Self {
            detached: true,
            ..Self::default()
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn serializer(&self) -> &InteractionSerializer {
        &self.serializer
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    /// Brings a rebuilt target on screen and reports its active interaction,
    /// which was held back while detached.
    pub(crate) fn attach(&mut self) -> Vec<Effect> {
        self.detached = false;
        let mut effects = Vec::new();
        self.release_next(&mut effects);
        if let Some(active) = self.serializer.active() {
            if !effects.iter().any(|e| matches!(e, Effect::InteractionActivated { .. })) {
                effects.push(Effect::InteractionActivated {
                    message_id: active.message_id.clone(),
                    kind: active.kind,
                });
            }
        }
        effects
    }

    pub fn apply(&mut self, event: Event) -> Vec<Effect> {
        let mut effects = Vec::new();
        match event.kind {
            EventKind::Text => self.apply_text(event, &mut effects),
            EventKind::Command(kind) => self.apply_command(kind, event, &mut effects),
            EventKind::Control(op) => self.apply_control(op, event, &mut effects),
        }
        effects
    }

    /// The user accepted or cancelled `message_id`. Stale callbacks are ignored.
    pub fn complete(&mut self, message_id: &str) -> Vec<Effect> {
        let mut effects = Vec::new();
        if !self.serializer.complete(message_id) {
            relay_debug!("ignoring decision for {}: not the active interaction", message_id);
            return effects;
        }
        if let Some(node) = self.document.node_mut(message_id) {
            node.widget = Some(WidgetState::Resolved);
        }
        self.release_next(&mut effects);
        effects
    }

    /// Stops a still-streaming reply or file edit in place, keeping what
    /// arrived so far. A withdrawn file edit lets the next proposal through.
    pub fn preserve_partial(&mut self, message_id: &str) -> Cancellation {
        let mut cancellation = Cancellation::default();
        let Some(node) = self.document.node_mut(message_id) else {
            return cancellation;
        };
        if node.terminal {
            return cancellation;
        }
        match node.kind() {
            NodeKind::AssistantText => {}
            NodeKind::Command(CommandKind::EditFile) => {
                node.content = strip_code_fence(&node.content);
                node.widget = Some(WidgetState::Cancelled);
            }
            _ => return cancellation,
        }
        node.terminal = true;
        node.cancelled = true;
        cancellation.preserved = (!node.content.is_empty()).then(|| node.content.clone());
        if self.serializer.withdraw(message_id) {
            self.release_next(&mut cancellation.effects);
        }
        cancellation
    }

    pub fn clear(&mut self) {
        self.document.clear();
        self.serializer.clear();
        self.turn_completed = false;
    }

    fn apply_text(&mut self, event: Event, effects: &mut Vec<Effect>) {
        if event.is_function_call && event.is_complete {
            relay_trace!("seq {}: function call end marker", event.sequence);
            return;
        }
        if event.is_silent() {
            relay_trace!("seq {}: silent message {}", event.sequence, event.message_id);
            return;
        }

        match self.document.node(&event.message_id) {
            Some(node) if node.kind().is_widget() => {
                relay_debug!(
                    "seq {}: text for widget {} ignored",
                    event.sequence,
                    event.message_id
                );
                return;
            }
            Some(node) if node.is_terminal() => {
                relay_trace!(
                    "seq {}: {} already terminal",
                    event.sequence,
                    event.message_id
                );
                return;
            }
            Some(_) => {}
            None => {
                self.document
                    .insert(&event.message_id, event.sequence, NodeKind::AssistantText);
            }
        }
        let Some(node) = self.document.node_mut(&event.message_id) else {
            return;
        };

        node.content.push_str(&event.payload);
        if !event.is_complete {
            return;
        }
        node.terminal = true;
        node.cancelled = event.is_cancelled;
        if !event.is_cancelled && !self.turn_completed {
            self.turn_completed = true;
            effects.push(Effect::TurnCompleted {
                message_id: event.message_id,
            });
        }
    }

    fn apply_command(&mut self, kind: CommandKind, event: Event, effects: &mut Vec<Effect>) {
        match self.document.node(&event.message_id) {
            Some(node) if node.kind() != NodeKind::Command(kind) => {
                relay_warn!(
                    "seq {}: {} is a {:?} node, not a {} widget",
                    event.sequence,
                    event.message_id,
                    node.kind(),
                    kind
                );
                return;
            }
            Some(node) if node.is_terminal() => {
                relay_trace!(
                    "seq {}: widget {} already terminal",
                    event.sequence,
                    event.message_id
                );
                return;
            }
            Some(_) => {}
            None => {
                let node = self.document.insert(
                    &event.message_id,
                    event.sequence,
                    NodeKind::Command(kind),
                );
                node.filename = event.filename.clone();
                self.serializer.enqueue(PendingInteraction::new(
                    event.message_id.clone(),
                    kind,
                    event.sequence,
                ));
            }
        }
        let Some(node) = self.document.node_mut(&event.message_id) else {
            return;
        };

        if event.replace_content && kind == CommandKind::EditFile {
            node.content = event.payload;
        } else {
            node.content.push_str(&event.payload);
        }
        if !event.is_complete {
            return;
        }

        node.terminal = true;
        if kind == CommandKind::EditFile {
            node.content = strip_code_fence(&node.content);
        }
        if event.is_cancelled {
            node.cancelled = true;
            node.widget = Some(WidgetState::Cancelled);
            self.serializer.withdraw(&event.message_id);
            self.release_next(effects);
            return;
        }

        node.widget = Some(WidgetState::Queued);
        if kind == CommandKind::EditFile && !self.detached {
            effects.push(Effect::FileEditReady {
                message_id: event.message_id.clone(),
                filename: node.filename.clone().unwrap_or_default(),
                content: node.content.clone(),
            });
        }
        self.serializer.mark_ready(&event.message_id);
        self.release_next(effects);
    }

    fn apply_control(&mut self, op: ControlOp, event: Event, effects: &mut Vec<Effect>) {
        match op {
            ControlOp::ClearConversation => self.clear(),
            ControlOp::UserMessage => {
                if self.insert_complete(&event, NodeKind::UserText) {
                    self.turn_completed = false;
                }
            }
            ControlOp::AssistantMessage => {
                self.insert_complete(&event, NodeKind::AssistantText);
            }
            ControlOp::FunctionCallNote => {
                self.insert_complete(&event, NodeKind::FunctionCall);
            }
            ControlOp::RevertMarker => {
                if !self.document.has_marker(&event.message_id) {
                    let node =
                        self.document
                            .insert(&event.message_id, event.sequence, NodeKind::Marker);
                    node.terminal = true;
                }
            }
            ControlOp::MarkResolved => self.mark_resolved(&event.message_id, effects),
            ControlOp::ThinkingStarted => {
                let text = if event.payload.is_empty() {
                    DEFAULT_THINKING_TEXT.to_owned()
                } else {
                    event.payload
                };
                self.document.set_thinking(Some(text));
            }
            ControlOp::ThinkingEnded => self.document.set_thinking(None),
            ControlOp::StartRecreation | ControlOp::FinishRecreation => {
                relay_debug!("seq {}: {:?} reached a reconciler", event.sequence, op);
            }
        }
    }

    /// Returns false when a node for the message already exists.
    fn insert_complete(&mut self, event: &Event, kind: NodeKind) -> bool {
        if self.document.node(&event.message_id).is_some() {
            return false;
        }
        let node = self
            .document
            .insert(&event.message_id, event.sequence, kind);
        node.content.push_str(&event.payload);
        node.terminal = true;
        true
    }

    fn mark_resolved(&mut self, message_id: &str, effects: &mut Vec<Effect>) {
        let Some(node) = self.document.node_mut(message_id) else {
            relay_debug!("resolve marker for unknown widget {}", message_id);
            return;
        };
        if !node.kind().is_widget() {
            return;
        }
        node.widget = Some(WidgetState::Resolved);
        if self.serializer.withdraw(message_id) {
            self.release_next(effects);
        }
    }

    fn release_next(&mut self, effects: &mut Vec<Effect>) {
        let Some(active) = self.serializer.release() else {
            return;
        };
        let message_id = active.message_id.clone();
        let kind = active.kind;
        if let Some(node) = self.document.node_mut(&message_id) {
            node.widget = Some(WidgetState::Active);
        }
        if !self.detached {
            effects.push(Effect::InteractionActivated { message_id, kind });
        }
    }
}
