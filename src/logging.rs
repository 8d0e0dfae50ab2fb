use std::io::stderr;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Level used when none is given or the given one is not recognised.
pub const DEFAULT_LEVEL: LevelFilter = LevelFilter::WARN;

pub fn parse_log_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Some(LevelFilter::TRACE),
        "debug" => Some(LevelFilter::DEBUG),
        "info" => Some(LevelFilter::INFO),
        "warn" => Some(LevelFilter::WARN),
        "error" => Some(LevelFilter::ERROR),
        "off" => Some(LevelFilter::OFF),
        _ => None,
    }
}

/// Installs the global subscriber. Logs go to stderr because stdout carries the CSV
/// report. Calling it twice is harmless; the second call is ignored.
pub fn init(level: LevelFilter) {
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(level);

    let _ = tracing_subscriber::registry().with(terminal_log).try_init();
}
