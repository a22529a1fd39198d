use std::time::Instant;

use relay_logging::{relay_debug, relay_info, relay_warn};

use crate::view_model::nodes_view;
use crate::{
    AdmitError, AdmitResult, Cancellation, ConversationId, ConversationSequenceTable,
    CursorSnapshot, Document, DocumentView, Effect, EngineConfig, Event, GapMonitor, GapReason,
    RecreationCoordinator, RecreationState, Sequence, SequenceBuffer,
};

/// Result of admitting one well-formed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub result: AdmitResult,
    pub effects: Vec<Effect>,
}

/// Reconciliation engine for the assistant panel: owns the reorder buffer,
/// the per-conversation cursors and the (double-buffered) document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Engine {
    config: EngineConfig,
    table: ConversationSequenceTable,
    buffer: SequenceBuffer,
    coordinator: RecreationCoordinator,
    gap: GapMonitor,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            buffer: SequenceBuffer::new(config.max_buffered),
            config,
            table: ConversationSequenceTable::new(),
            coordinator: RecreationCoordinator::new(),
            gap: GapMonitor::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn active_conversation(&self) -> Option<ConversationId> {
        self.table.active()
    }

    pub fn next_expected(&self) -> Sequence {
        self.buffer.next_expected()
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.pending_len()
    }

    pub fn recreation_state(&self) -> RecreationState {
        self.coordinator.state()
    }

    /// The document currently on screen.
    pub fn document(&self) -> &Document {
        self.coordinator.live().document()
    }

    /// The document being rebuilt off-screen, if a recreation is running.
    pub fn staging_document(&self) -> Option<&Document> {
        self.coordinator.staging().map(|staged| staged.document())
    }

    pub fn sequence_table(&self) -> &ConversationSequenceTable {
        &self.table
    }

    pub fn coordinator(&self) -> &RecreationCoordinator {
        &self.coordinator
    }

    pub fn view(&self) -> DocumentView {
        let document = self.document();
        DocumentView {
            conversation_id: self.table.active(),
            recreation: self.coordinator.state(),
            next_expected: self.buffer.next_expected(),
            buffered: self.buffer.pending_len(),
            thinking: document.thinking().map(ToOwned::to_owned),
            nodes: nodes_view(document),
        }
    }

    /// Validates `event` and routes it through the reorder buffer.
    /// Malformed events leave the buffer untouched.
    pub fn admit(&mut self, event: Event) -> Result<Admission, AdmitError> {
        if let Err(error) = event.validate() {
            relay_warn!("rejected event: {}", error);
            return Err(error);
        }

        let mut effects = Vec::new();
        let coordinator = &mut self.coordinator;
        let applied = &mut effects;
        let outcome = self
            .buffer
            .admit(event, |ready| applied.extend(coordinator.apply(ready)));

        let result = match outcome {
            Ok(result) => result,
            Err(full) => {
                relay_warn!("{}", full);
                effects.push(Effect::ResyncRequested {
                    conversation_id: self.table.active(),
                    reason: GapReason::Capacity {
                        limit: full.limit,
                        waiting_for: full.waiting_for,
                    },
                });
                AdmitResult::Dropped
            }
        };
        Ok(Admission { result, effects })
    }

    pub fn switch_to(&mut self, conversation_id: ConversationId) {
        relay_logging::set_active_conversation(Some(conversation_id));
        self.table.switch_to(conversation_id, &mut self.buffer);
        self.gap.reset();
    }

    /// Accept or cancel on the active interaction of the visible document.
    pub fn complete(&mut self, message_id: &str) -> Vec<Effect> {
        self.coordinator.live_mut().complete(message_id)
    }

    /// Stops a streaming reply or file edit, keeping its partial content.
    pub fn preserve_partial(&mut self, message_id: &str) -> Cancellation {
        let cancellation = self.coordinator.preserve_partial(message_id);
        if let Some(content) = &cancellation.preserved {
            relay_info!(
                "preserved {} bytes of cancelled {}",
                content.len(),
                message_id
            );
        }
        cancellation
    }

    /// Rebuilds a conversation from already-ordered stored events. Gaps
    /// in stored history move the cursor forward instead of buffering.
    pub fn load_history(&mut self, conversation_id: ConversationId, events: Vec<Event>) -> Vec<Effect> {
        self.switch_to(conversation_id);
        self.coordinator.reset();

        let total = events.len();
        let mut effects = Vec::new();
        if let Some(first) = events.first() {
            self.buffer.reset(first.sequence);
        }
        for event in events {
            if event.sequence > self.buffer.next_expected() && !event.bypasses_ordering() {
                relay_debug!(
                    "history gap before {}; cursor moved from {}",
                    event.sequence,
                    self.buffer.next_expected()
                );
                self.buffer.rebase(event.sequence);
            }
            match self.admit(event) {
                Ok(admission) => effects.extend(admission.effects),
                Err(error) => effects.push(Effect::EventRejected { error }),
            }
        }
        relay_info!(
            "loaded {} history events; {} nodes, cursor {}",
            total,
            self.document().len(),
            self.buffer.next_expected()
        );
        effects
    }

    /// Empties the document and the reorder buffer; cursors are kept.
    pub fn clear_messages(&mut self) {
        self.coordinator.reset();
        self.buffer.clear_pending();
        self.gap.reset();
    }

    pub fn forget(&mut self, conversation_id: ConversationId) {
        self.table.forget(conversation_id);
        if self.table.active().is_none() {
            relay_logging::set_active_conversation(None);
        }
    }

    pub fn cursor_snapshot(&self) -> CursorSnapshot {
        self.table.snapshot(&self.buffer)
    }

    pub fn restore_cursors(&mut self, snapshot: CursorSnapshot) {
        self.table.restore(snapshot);
    }

    /// Reports a gap that held buffered events past the stall timeout.
    pub fn check_stall(&mut self, now: Instant) -> Vec<Effect> {
        if !self
            .gap
            .observe(&self.buffer, now, self.config.stall_timeout())
        {
            return Vec::new();
        }
        let reason = GapReason::Stalled {
            waiting_for: self.buffer.next_expected(),
            buffered: self.buffer.pending_len(),
        };
        relay_warn!("reorder buffer stalled: {:?}", reason);
        vec![Effect::ResyncRequested {
            conversation_id: self.table.active(),
            reason,
        }]
    }
}
