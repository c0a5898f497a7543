//! Module implementing logging for the application.
//!
//! The `log` crate macros are routed into `slog`, through the global logger
//! of `slog_scope`. Records are formatted on a separate thread by `slog_async`.

use std::env;

use log::SetLoggerError;
use slog::{self, Drain, FilterLevel, Logger};
use slog_scope::GlobalLoggerGuard;


// Default logging level defined using the two enums used by `slog`.
// Both values must correspond to the same level. (This is checked by a test).
const DEFAULT_LEVEL: slog::Level = slog::Level::Info;
const DEFAULT_FILTER_LEVEL: FilterLevel = FilterLevel::Info;

// Arrays of log levels, indexed by verbosity.
const POSITIVE_VERBOSITY_LEVELS: &'static [FilterLevel] = &[
    DEFAULT_FILTER_LEVEL,
    FilterLevel::Debug,
    FilterLevel::Trace,
];
const NEGATIVE_VERBOSITY_LEVELS: &'static [FilterLevel] = &[
    DEFAULT_FILTER_LEVEL,
    FilterLevel::Warning,
    FilterLevel::Error,
    FilterLevel::Critical,
    FilterLevel::Off,
];


/// Initialize logging with given verbosity.
/// The verbosity value has the same meaning as in args::Options::verbosity.
///
/// The returned guard must be kept alive for as long as the logging is needed.
pub fn init(verbosity: isize) -> Result<GlobalLoggerGuard, SetLoggerError> {
    let level = level_for(verbosity);

    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();

    // Verbosity sets the level for the whole application,
    // but it can be overridden per module through $RUST_LOG.
    let mut builder = slog_envlogger::LogBuilder::new(drain)
        .filter(None, level);
    if let Ok(filters) = env::var("RUST_LOG") {
        builder = builder.parse(&filters);
    }
    let drain = slog_async::Async::new(builder.build().fuse())
        .thread_name("logging".into())
        .build().fuse();

    let logger = Logger::root(drain, slog::o!());
    let guard = slog_scope::set_global_logger(logger);
    slog_stdlog::init_with_level(as_log_level(level))?;

    if verbosity > 0 {
        info!("Logging initialized at level {}", level.as_str());
    }
    Ok(guard)
}

/// Convert the verbosity from the command line into a logging level.
fn level_for(verbosity: isize) -> FilterLevel {
    let levels = if verbosity >= 0 { POSITIVE_VERBOSITY_LEVELS } else { NEGATIVE_VERBOSITY_LEVELS };
    let index = (verbosity.unsigned_abs()).min(levels.len() - 1);
    levels[index]
}

/// Maximum level of records that `log` should pass on to `slog`.
fn as_log_level(level: FilterLevel) -> log::Level {
    match level {
        FilterLevel::Trace => log::Level::Trace,
        FilterLevel::Debug => log::Level::Debug,
        FilterLevel::Info => log::Level::Info,
        FilterLevel::Warning => log::Level::Warn,
        // `log` can't be turned off completely here; `slog` will filter the rest.
        _ => log::Level::Error,
    }
}
