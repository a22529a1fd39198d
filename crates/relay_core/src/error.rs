use thiserror::Error;

use crate::{EventKind, Sequence};

/// Reasons an event is refused before it reaches the reorder buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmitError {
    #[error("event {sequence} ({kind}) has no message id")]
    MissingMessageId { sequence: Sequence, kind: EventKind },
    #[error("event {sequence} leaves no room for a successor sequence")]
    SequenceExhausted { sequence: Sequence },
    #[error("file-edit event {sequence} for message {message_id} has no filename")]
    MissingFilename {
        sequence: Sequence,
        message_id: String,
    },
}

impl AdmitError {
    pub fn sequence(&self) -> Sequence {
        match self {
            AdmitError::MissingMessageId { sequence, .. }
            | AdmitError::SequenceExhausted { sequence }
            | AdmitError::MissingFilename { sequence, .. } => *sequence,
        }
    }
}

/// The reorder buffer is at capacity and refused an early event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("reorder buffer full ({limit} events) while waiting for sequence {waiting_for}; refused {sequence}")]
pub struct BufferFull {
    pub sequence: Sequence,
    pub waiting_for: Sequence,
    pub limit: usize,
}
