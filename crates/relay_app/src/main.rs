//! Replays a recorded assistant-panel event stream through the relay engine
//! and prints the reconciled conversation.
mod app;
mod config;
mod effects;
mod logging;
mod render;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    let args = app::Args::parse();
    logging::initialize(args.log);
    app::run(args)
}
