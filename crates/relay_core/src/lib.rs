//! Relay core: pure reconciliation engine for a streamed assistant conversation.
//!
//! Events arrive tagged with a per-conversation sequence number, possibly out
//! of order and more than once. The engine buffers early events, applies them
//! to a document strictly in sequence order, rebuilds conversations off-screen
//! and swaps them in atomically, and lets only one command proposal at a time
//! accept user input.
mod code_block;
mod config;
mod document;
mod effect;
mod engine;
mod error;
mod event;
mod msg;
mod reconciler;
mod recreation;
mod sequence;
mod serializer;
mod table;
mod update;
mod view_model;

pub use code_block::{language_for_filename, strip_code_fence};
pub use config::{EngineConfig, DEFAULT_MAX_BUFFERED, DEFAULT_STALL_TIMEOUT_MS};
pub use document::{Document, DocumentNode, NodeId, NodeKind, WidgetState};
pub use effect::{Effect, GapReason};
pub use engine::{Admission, Engine};
pub use error::{AdmitError, BufferFull};
pub use event::{
    CommandKind, ControlOp, ConversationId, Event, EventKind, Sequence, SILENT_MESSAGE_PREFIX,
};
pub use msg::Msg;
pub use reconciler::{Cancellation, DocumentReconciler};
pub use recreation::{RecreationCoordinator, RecreationState};
pub use sequence::{AdmitResult, GapMonitor, SequenceBuffer, INITIAL_SEQUENCE};
pub use serializer::{InteractionSerializer, PendingInteraction};
pub use table::{ConversationSequenceTable, CursorSnapshot};
pub use update::update;
pub use view_model::{DocumentView, NodeStatus, NodeView};
