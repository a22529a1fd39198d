#![deny(missing_docs)]
//! Shared logging utilities for the relay workspace.
//!
//! This crate provides the `relay_*` logging macros used across the codebase,
//! a thread-local conversation context that every macro prefixes onto its
//! message, and a minimal test initializer for the global logger.

use std::cell::Cell;

thread_local! {
    /// Conversation currently driven by this thread, if any.
    static ACTIVE_CONVERSATION: Cell<Option<i64>> = const { Cell::new(None) };
}

/// Sets the conversation id reported by the logging macros on this thread.
/// The engine calls this whenever the active conversation changes.
pub fn set_active_conversation(conversation_id: Option<i64>) {
    ACTIVE_CONVERSATION.with(|v| v.set(conversation_id));
}

/// Retrieves the conversation id set for the current thread.
pub fn active_conversation() -> Option<i64> {
    ACTIVE_CONVERSATION.with(|v| v.get())
}

/// Formats the prefix placed before every macro-emitted message.
#[doc(hidden)]
pub fn context_prefix() -> String {
    match active_conversation() {
        Some(id) => format!("[conv {id}] "),
        None => String::from("[conv -] "),
    }
}

/// Logs a trace-level message with the conversation prefix.
#[macro_export]
macro_rules! relay_trace {
    ($($arg:tt)*) => {{
        log::trace!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message with the conversation prefix.
#[macro_export]
macro_rules! relay_debug {
    ($($arg:tt)*) => {{
        log::debug!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message with the conversation prefix.
#[macro_export]
macro_rules! relay_info {
    ($($arg:tt)*) => {{
        log::info!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message with the conversation prefix.
#[macro_export]
macro_rules! relay_warn {
    ($($arg:tt)*) => {{
        log::warn!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message with the conversation prefix.
#[macro_export]
macro_rules! relay_error {
    ($($arg:tt)*) => {{
        log::error!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Trace in debug builds so stale-drop paths show up, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Trace
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
