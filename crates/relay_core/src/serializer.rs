use std::collections::VecDeque;

use crate::{CommandKind, Sequence};

/// A command widget waiting for its content or for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingInteraction {
    pub message_id: String,
    pub kind: CommandKind,
    /// Originating sequence; decides queue position.
    pub sequence: Sequence,
    /// Content has fully arrived.
    pub ready: bool,
}

impl PendingInteraction {
    pub fn new(message_id: impl Into<String>, kind: CommandKind, sequence: Sequence) -> Self {
        Self {
            message_id: message_id.into(),
            kind,
            sequence,
            ready: false,
        }
    }
}

/// FIFO gate for command proposals: only the head can be active, and only
/// once its content is ready.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InteractionSerializer {
    queue: VecDeque<PendingInteraction>,
    active: bool,
}

impl InteractionSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `interaction` by originating sequence. Ids already queued are ignored.
    pub fn enqueue(&mut self, interaction: PendingInteraction) {
        if self.contains(&interaction.message_id) {
            return;
        }
        let position = self
            .queue
            .iter()
            .enumerate()
            // The active head keeps its place even if an older sequence shows up.
            .skip(usize::from(self.active))
            .find(|(_, queued)| queued.sequence > interaction.sequence)
            .map_or(self.queue.len(), |(index, _)| index);
        self.queue.insert(position, interaction);
    }

    pub fn mark_ready(&mut self, message_id: &str) -> bool {
        match self.queue.iter_mut().find(|p| p.message_id == message_id) {
            Some(pending) => {
                pending.ready = true;
                true
            }
            None => false,
        }
    }

    /// Activates the head when nothing is active and the head is ready.
    /// Returns the newly activated interaction.
    pub fn release(&mut self) -> Option<&PendingInteraction> {
        if self.active {
            return None;
        }
        let head = self.queue.front()?;
        if !head.ready {
            return None;
        }
        self.active = true;
        self.queue.front()
    }

    /// The user decided on `message_id`. Ignored unless it is the active head.
    pub fn complete(&mut self, message_id: &str) -> bool {
        if self.active().map(|p| p.message_id.as_str()) != Some(message_id) {
            return false;
        }
        self.queue.pop_front();
        self.active = false;
        true
    }

    /// Removes an interaction that will never need a decision (cancelled
    /// stream, or already decided before a reload).
    pub fn withdraw(&mut self, message_id: &str) -> bool {
        let Some(index) = self.queue.iter().position(|p| p.message_id == message_id) else {
            return false;
        };
        if index == 0 && self.active {
            self.active = false;
        }
        self.queue.remove(index);
        true
    }

    pub fn active(&self) -> Option<&PendingInteraction> {
        if self.active {
            self.queue.front()
        } else {
            None
        }
    }

    pub fn contains(&self, message_id: &str) -> bool {
        self.queue.iter().any(|p| p.message_id == message_id)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn pending(&self) -> impl Iterator<Item = &PendingInteraction> + '_ {
        self.queue.iter()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.active = false;
    }
}
