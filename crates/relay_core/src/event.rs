use std::fmt;

use serde::{Deserialize, Serialize};

use crate::AdmitError;

/// Position of an event within one conversation's stream.
pub type Sequence = u64;
pub type ConversationId = i64;

/// Message ids with this prefix belong to background conversation-name
/// generation and never show up in the document.
pub const SILENT_MESSAGE_PREFIX: &str = "conv_name_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Console,
    Terminal,
    EditFile,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::Console => write!(f, "console"),
            CommandKind::Terminal => write!(f, "terminal"),
            CommandKind::EditFile => write!(f, "edit_file"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlOp {
    /// Backend is rebuilding the conversation from scratch.
    ClearConversation,
    StartRecreation,
    FinishRecreation,
    /// Complete user message (history or echo of the prompt).
    UserMessage,
    /// Complete assistant message (history).
    AssistantMessage,
    FunctionCallNote,
    RevertMarker,
    /// A widget the user already decided on before the conversation was reloaded.
    MarkResolved,
    ThinkingStarted,
    ThinkingEnded,
}

impl ControlOp {
    /// Discontinuity signals are applied on arrival and reset the cursor.
    pub fn bypasses_ordering(self) -> bool {
        matches!(self, ControlOp::ClearConversation | ControlOp::StartRecreation)
    }

    fn needs_message_id(self) -> bool {
        matches!(
            self,
            ControlOp::UserMessage
                | ControlOp::AssistantMessage
                | ControlOp::FunctionCallNote
                | ControlOp::RevertMarker
                | ControlOp::MarkResolved
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Text,
    Command(CommandKind),
    Control(ControlOp),
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Text => write!(f, "text"),
            EventKind::Command(kind) => write!(f, "command:{kind}"),
            EventKind::Control(op) => write!(f, "control:{op:?}"),
        }
    }
}

/// One incremental update for the active conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub sequence: Sequence,
    pub kind: EventKind,
    #[serde(default)]
    pub message_id: String,
    #[serde(default)]
    pub payload: String,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default)]
    pub is_cancelled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// File-edit deltas only: replace accumulated content instead of appending.
    #[serde(default)]
    pub replace_content: bool,
    /// Closing marker of a function-call stream; carries nothing to render.
    #[serde(default)]
    pub is_function_call: bool,
}

impl Event {
    pub fn new(sequence: Sequence, kind: EventKind, message_id: impl Into<String>) -> Self {
        Self {
            sequence,
            kind,
            message_id: message_id.into(),
            payload: String::new(),
            is_complete: false,
            is_cancelled: false,
            filename: None,
            replace_content: false,
            is_function_call: false,
        }
    }

    pub fn text(sequence: Sequence, message_id: impl Into<String>, delta: impl Into<String>) -> Self {
        Self::new(sequence, EventKind::Text, message_id).with_payload(delta)
    }

    pub fn command(
        sequence: Sequence,
        kind: CommandKind,
        message_id: impl Into<String>,
        delta: impl Into<String>,
    ) -> Self {
        Self::new(sequence, EventKind::Command(kind), message_id).with_payload(delta)
    }

    pub fn control(sequence: Sequence, op: ControlOp, message_id: impl Into<String>) -> Self {
        Self::new(sequence, EventKind::Control(op), message_id)
    }

    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn replacing(mut self) -> Self {
        self.replace_content = true;
        self
    }

    pub fn complete(mut self) -> Self {
        self.is_complete = true;
        self
    }

    pub fn cancelled(mut self) -> Self {
        self.is_complete = true;
        self.is_cancelled = true;
        self
    }

    pub fn function_call_end(mut self) -> Self {
        self.is_complete = true;
        self.is_function_call = true;
        self
    }

    pub fn bypasses_ordering(&self) -> bool {
        matches!(self.kind, EventKind::Control(op) if op.bypasses_ordering())
    }

    pub fn is_silent(&self) -> bool {
        self.message_id.starts_with(SILENT_MESSAGE_PREFIX)
    }

    /// Checks the fields each kind requires. Runs before the event touches
    /// the reorder buffer.
    pub fn validate(&self) -> Result<(), AdmitError> {
        // The cursor must be able to move past every applied event.
        if self.sequence == Sequence::MAX {
            return Err(AdmitError::SequenceExhausted {
                sequence: self.sequence,
            });
        }
        let needs_id = match self.kind {
            EventKind::Text | EventKind::Command(_) => true,
            EventKind::Control(op) => op.needs_message_id(),
        };
        if needs_id && self.message_id.trim().is_empty() {
            return Err(AdmitError::MissingMessageId {
                sequence: self.sequence,
                kind: self.kind,
            });
        }
        if self.kind == EventKind::Command(CommandKind::EditFile)
            && self.filename.as_deref().is_none_or(|name| name.trim().is_empty())
        {
            return Err(AdmitError::MissingFilename {
                sequence: self.sequence,
                message_id: self.message_id.clone(),
            });
        }
        Ok(())
    }
}
