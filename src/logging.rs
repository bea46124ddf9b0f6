// File: ./src/logging.rs
//! Installs the `log` backend: warnings to stderr, everything at the
//! configured level to a log file in the data directory.
use crate::context::AppContext;
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};
use std::fs::OpenOptions;

/// Safe to call more than once; only the first call installs a logger.
pub fn init(ctx: &dyn AppContext, level: LevelFilter) {
    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Error)
        .set_time_format_rfc3339()
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        LevelFilter::Warn.min(level),
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    if let Some(path) = ctx.get_log_path() {
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => loggers.push(WriteLogger::new(level, config, file)),
            Err(e) => eprintln!("Could not open log file {:?}: {}", path, e),
        }
    }

    let _ = CombinedLogger::init(loggers);
}
