use crate::{AdmitError, CommandKind, ConversationId, Sequence};

/// Signals for the host. The engine never acts on them itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// A command widget's accept/cancel controls became live.
    InteractionActivated {
        message_id: String,
        kind: CommandKind,
    },
    /// An assistant reply finished without being cancelled (once per turn).
    TurnCompleted { message_id: String },
    /// A finished file-edit proposal, handed to the diff collaborator.
    FileEditReady {
        message_id: String,
        filename: String,
        content: String,
    },
    /// The reorder buffer cannot make progress; the host should resynchronize.
    ResyncRequested {
        conversation_id: Option<ConversationId>,
        reason: GapReason,
    },
    /// A malformed event was refused at admission.
    EventRejected { error: AdmitError },
    /// The rebuilt document replaced the live one.
    RecreationSwapped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapReason {
    /// The buffer hit its size cap.
    Capacity { limit: usize, waiting_for: Sequence },
    /// Buffered events waited past the stall timeout.
    Stalled { waiting_for: Sequence, buffered: usize },
}
