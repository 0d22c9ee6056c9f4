//! Logger setup for the demo binary and ad-hoc debugging.

use env_logger::{Builder, Env};
use log::{debug, LevelFilter};

/// Initializes the global logger.
///
/// When `verbose` is `true`, this crate logs at debug level; otherwise only
/// info and above are shown. Other crates stay at `warn` unless `RUST_LOG`
/// says otherwise.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let env = Env::default().default_filter_or(format!("warn,anchor_sync={level}"));
    let mut builder = Builder::from_env(env);
    builder.format_timestamp_millis();

    // A logger may already be installed when tests call `init` repeatedly.
    if builder.try_init().is_err() {
        debug!("logger already initialised");
    }
}
