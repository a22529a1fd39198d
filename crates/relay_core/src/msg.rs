use std::time::Instant;

use crate::{ConversationId, Event};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Event delivered by the transport, in any order, possibly repeated.
    Inbound(Event),
    /// User navigated to another conversation.
    SwitchConversation(ConversationId),
    /// User accepted or cancelled a command widget.
    InteractionResolved { message_id: String },
    /// Stored, already-ordered events for a conversation being opened.
    HistoryLoaded {
        conversation_id: ConversationId,
        events: Vec<Event>,
    },
    /// User stopped a streaming reply; keep what arrived.
    CancelStreaming { message_id: String },
    /// Host emptied the panel; cursors are kept.
    ClearMessages,
    /// The conversation was deleted by the storage layer.
    ConversationDeleted(ConversationId),
    /// Periodic clock used for stall detection.
    Tick(Instant),
    /// Fallback for placeholder wiring.
    NoOp,
}
