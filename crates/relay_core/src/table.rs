use std::collections::{BTreeMap, HashMap};

use relay_logging::relay_info;
use serde::{Deserialize, Serialize};

use crate::sequence::INITIAL_SEQUENCE;
use crate::{ConversationId, Sequence, SequenceBuffer};

/// Saved cursors, in a form the storage collaborator can persist.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CursorSnapshot {
    pub active: Option<ConversationId>,
    pub cursors: BTreeMap<ConversationId, Sequence>,
}

/// Remembers each conversation's next expected sequence while another one
/// is active.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConversationSequenceTable {
    active: Option<ConversationId>,
    cursors: HashMap<ConversationId, Sequence>,
}

impl ConversationSequenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<ConversationId> {
        self.active
    }

    pub fn saved_cursor(&self, conversation_id: ConversationId) -> Option<Sequence> {
        self.cursors.get(&conversation_id).copied()
    }

    /// Saves the outgoing cursor, loads the target's (or the initial one) into
    /// `buffer`, and discards anything buffered for the outgoing conversation.
    pub fn switch_to(&mut self, conversation_id: ConversationId, buffer: &mut SequenceBuffer) {
        let previous = self.active;
        if let Some(current) = previous {
            self.cursors.insert(current, buffer.next_expected());
        }
        let dropped = buffer.pending_len();
        let cursor = self
            .cursors
            .get(&conversation_id)
            .copied()
            .unwrap_or(INITIAL_SEQUENCE);
        buffer.reset(cursor);
        self.active = Some(conversation_id);
        relay_info!(
            "switched from {:?} to conversation {} at cursor {} ({} buffered events discarded)",
            previous,
            conversation_id,
            cursor,
            dropped
        );
    }

    /// Drops the saved cursor of a conversation deleted elsewhere.
    pub fn forget(&mut self, conversation_id: ConversationId) {
        self.cursors.remove(&conversation_id);
        if self.active == Some(conversation_id) {
            self.active = None;
        }
    }

    pub fn snapshot(&self, buffer: &SequenceBuffer) -> CursorSnapshot {
        let mut cursors: BTreeMap<_, _> = self.cursors.iter().map(|(k, v)| (*k, *v)).collect();
        if let Some(active) = self.active {
            cursors.insert(active, buffer.next_expected());
        }
        CursorSnapshot {
            active: self.active,
            cursors,
        }
    }

    /// Replaces saved cursors with a persisted snapshot. The active
    /// conversation is left unset; the host selects it with `switch_to`.
    pub fn restore(&mut self, snapshot: CursorSnapshot) {
        self.cursors = snapshot.cursors.into_iter().collect();
        self.active = None;
    }
}
