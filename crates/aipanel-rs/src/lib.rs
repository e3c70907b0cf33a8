//! Public surface for the AI admin panel.
//!
//! This crate re-exports the building blocks, hosts the line-oriented
//! console surface, and provides a small initialization helper so the
//! binary and embedders configure logging the same way.

pub mod console;

/// Re-export for convenience.
pub use aipanel_rs_config as config;
/// Re-export for convenience.
pub use aipanel_rs_core as core;
/// Re-export for convenience.
pub use aipanel_rs_protocol as protocol;
/// Re-export for convenience.
pub use aipanel_rs_tui as tui;

/// Install `env_logger` with millisecond timestamps.
///
/// `RUST_LOG` controls the filter. Calling this more than once is harmless;
/// later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::builder()
        .format_timestamp_millis()
        .parse_default_env()
        .try_init();
}
