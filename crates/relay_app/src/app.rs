use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use relay_core::{update, ConversationId, Engine, Msg};
use relay_history::{load_history_file, CursorStore};
use relay_logging::{relay_error, relay_info, relay_warn};

use crate::config::load_config;
use crate::effects::EffectRunner;
use crate::logging::LogDestination;
use crate::render;

#[derive(Debug, Parser)]
#[command(
    name = "relay_app",
    about = "Replay assistant panel events and print the reconciled conversation"
)]
pub struct Args {
    /// JSON-lines event script, in the order the transport delivered it
    pub events: PathBuf,

    /// Stored history to load before replaying the script
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// RON config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory for saved cursors and staged file edits
    #[arg(long, default_value = ".relay")]
    pub state: PathBuf,

    /// Conversation the script belongs to
    #[arg(long, default_value_t = 1)]
    pub conversation: ConversationId,

    /// Accept every command proposal as soon as it becomes active
    #[arg(long)]
    pub auto_accept: bool,

    #[arg(long, value_enum, default_value_t = LogDestination::File)]
    pub log: LogDestination,
}

pub fn run(args: Args) -> Result<()> {
    let config = load_config(args.config.as_deref());
    let stall_timeout = config.engine.stall_timeout();
    let mut engine = Engine::new(config.engine);

    let store = CursorStore::new(&args.state);
    match store.load() {
        Ok(Some(saved)) => engine.restore_cursors(saved.snapshot),
        Ok(None) => {}
        Err(err) => relay_warn!("Ignoring saved cursors in {:?}: {}", store.path(), err),
    }

    let script = load_history_file(&args.events)
        .with_context(|| format!("reading event script {:?}", args.events))?;

    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let runner = EffectRunner::new(
        msg_tx.clone(),
        args.auto_accept || config.auto_accept,
        args.state.join("edits"),
    );

    match &args.history {
        Some(path) => {
            let events = load_history_file(path)
                .with_context(|| format!("reading history {:?}", path))?;
            let _ = msg_tx.send(Msg::HistoryLoaded {
                conversation_id: args.conversation,
                events,
            });
        }
        None => {
            let _ = msg_tx.send(Msg::SwitchConversation(args.conversation));
        }
    }
    for event in script {
        let _ = msg_tx.send(Msg::Inbound(event));
    }
    // A gap still open once the script is exhausted is reported as stalled.
    let started = Instant::now();
    let _ = msg_tx.send(Msg::Tick(started));
    let _ = msg_tx.send(Msg::Tick(started + stall_timeout));

    let mut dispatched = 0usize;
    while let Ok(msg) = msg_rx.try_recv() {
        let (next, effects) = update(engine, msg);
        engine = next;
        runner.run(effects);
        dispatched += 1;
    }
    relay_info!(
        "dispatched {} messages; {} nodes, {} events still buffered",
        dispatched,
        engine.document().len(),
        engine.buffered_len()
    );

    print!("{}", render::render(&engine.view()));

    if let Err(err) = store.save(&engine.cursor_snapshot()) {
        relay_error!("Failed to save cursors to {:?}: {}", store.path(), err);
    }
    Ok(())
}
