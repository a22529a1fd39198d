use relay_logging::{relay_debug, relay_info};

use crate::{Cancellation, ControlOp, DocumentReconciler, Effect, Event, EventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecreationState {
    #[default]
    Live,
    Recreating,
}

/// Double-buffers the document: while a conversation is rebuilt, events go
/// to a detached reconciler and the live one stays untouched until the swap.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecreationCoordinator {
    live: DocumentReconciler,
    staging: Option<DocumentReconciler>,
}

impl RecreationCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RecreationState {
        if self.staging.is_some() {
            RecreationState::Recreating
        } else {
            RecreationState::Live
        }
    }

    /// The document the user sees.
    pub fn live(&self) -> &DocumentReconciler {
        &self.live
    }

    /// The document being rebuilt, if any.
    pub fn staging(&self) -> Option<&DocumentReconciler> {
        self.staging.as_ref()
    }

    /// Where `apply` currently writes.
    pub fn target_mut(&mut self) -> &mut DocumentReconciler {
        self.staging.as_mut().unwrap_or(&mut self.live)
    }

    /// User decisions always concern the visible widgets.
    pub fn live_mut(&mut self) -> &mut DocumentReconciler {
        &mut self.live
    }

    pub fn start_recreation(&mut self) {
        if self.staging.is_some() {
            relay_info!("recreation restarted; discarding unfinished rebuild");
        } else {
            relay_info!("recreation started");
        }
        self.staging = Some(DocumentReconciler::detached());
    }

    /// Swaps the rebuilt document in. Without a rebuild in progress this is a
    /// no-op, since completion signals can race with navigation.
    pub fn finish_recreation(&mut self) -> Vec<Effect> {
        let Some(mut staged) = self.staging.take() else {
            relay_debug!("finish recreation while live; ignored");
            return Vec::new();
        };
        let mut effects = staged.attach();
        let replaced = std::mem::replace(&mut self.live, staged);
        relay_info!(
            "recreation finished: {} nodes replaced by {}",
            replaced.document().len(),
            self.live.document().len()
        );
        effects.push(Effect::RecreationSwapped);
        effects
    }

    /// Drops any rebuild in progress and empties the live document.
    pub fn reset(&mut self) {
        self.staging = None;
        self.live.clear();
    }

    /// Stops a stream in the rebuild if it is there, otherwise on screen:
    /// a reply that began before the rebuild still belongs to the live document.
    pub fn preserve_partial(&mut self, message_id: &str) -> Cancellation {
        if let Some(staged) = self
            .staging
            .as_mut()
            .filter(|staged| staged.document().node(message_id).is_some())
        {
            return staged.preserve_partial(message_id);
        }
        self.live.preserve_partial(message_id)
    }

    pub fn apply(&mut self, event: Event) -> Vec<Effect> {
        match event.kind {
            EventKind::Control(ControlOp::StartRecreation) => {
                self.start_recreation();
                Vec::new()
            }
            EventKind::Control(ControlOp::FinishRecreation) => self.finish_recreation(),
            _ => self.target_mut().apply(event),
        }
    }
}
