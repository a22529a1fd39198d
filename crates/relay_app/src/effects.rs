use std::path::{Path, PathBuf};
use std::sync::mpsc;

use relay_core::{Effect, Msg};
use relay_history::AtomicFileWriter;
use relay_logging::{relay_error, relay_info, relay_warn};

/// Carries out what `update` asks for; follow-up messages go back on the queue.
pub struct EffectRunner {
    msg_tx: mpsc::Sender<Msg>,
    auto_accept: bool,
    edits: AtomicFileWriter,
}

impl EffectRunner {
    pub fn new(msg_tx: mpsc::Sender<Msg>, auto_accept: bool, edits_dir: PathBuf) -> Self {
        Self {
            msg_tx,
            auto_accept,
            edits: AtomicFileWriter::new(edits_dir),
        }
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::InteractionActivated { message_id, kind } => {
                    relay_info!("{} proposal {} awaits a decision", kind, message_id);
                    if self.auto_accept {
                        let _ = self.msg_tx.send(Msg::InteractionResolved { message_id });
                    }
                }
                Effect::TurnCompleted { message_id } => {
                    relay_info!("turn completed by {}", message_id);
                }
                Effect::FileEditReady {
                    message_id,
                    filename,
                    content,
                } => self.stage_edit(&message_id, &filename, &content),
                Effect::ResyncRequested {
                    conversation_id,
                    reason,
                } => {
                    relay_warn!(
                        "resync requested for conversation {:?}: {:?}",
                        conversation_id,
                        reason
                    );
                }
                Effect::EventRejected { error } => {
                    relay_warn!("event {} rejected: {}", error.sequence(), error);
                }
                Effect::RecreationSwapped => {
                    relay_info!("rebuilt conversation is now on screen");
                }
            }
        }
    }

    /// Proposed file contents land under the edits directory, keyed by file name.
    fn stage_edit(&self, message_id: &str, filename: &str, content: &str) {
        let Some(name) = Path::new(filename).file_name().and_then(|n| n.to_str()) else {
            relay_warn!("edit {} has no usable file name: {:?}", message_id, filename);
            return;
        };
        match self.edits.write(name, content) {
            Ok(path) => relay_info!("staged edit {} for {} at {:?}", message_id, filename, path),
            Err(err) => relay_error!("Failed to stage edit {}: {}", message_id, err),
        }
    }
}
