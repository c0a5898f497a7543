//! Module implementing logging for the application.
//!
//! Logs go to standard error, so they don't mix with the results
//! printed on standard output.

use std::env;
use std::sync::Mutex;

use log::SetLoggerError;
use slog::{self, Drain, FilterLevel, Logger};
use slog_scope::GlobalLoggerGuard;


// Arrays of log levels, indexed by verbosity.
// By default, only problems are reported.
const POSITIVE_VERBOSITY_LEVELS: &'static [FilterLevel] = &[
    FilterLevel::Warning,
    FilterLevel::Info,
    FilterLevel::Debug,
    FilterLevel::Trace,
];
const NEGATIVE_VERBOSITY_LEVELS: &'static [FilterLevel] = &[
    FilterLevel::Warning,
    FilterLevel::Error,
    FilterLevel::Critical,
    FilterLevel::Off,
];


/// Initialize logging with given verbosity.
/// The verbosity value has the same meaning as in args::Options::verbosity.
pub fn init(verbosity: isize) -> Result<GlobalLoggerGuard, SetLoggerError> {
    let level = level_for(verbosity);

    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::CompactFormat::new(decorator).build().fuse();

    let mut builder = slog_envlogger::LogBuilder::new(drain)
        .filter(None, level);
    if let Ok(filters) = env::var("RUST_LOG") {
        builder = builder.parse(&filters);
    }
    // Records are formatted on the calling thread.
    let drain = Mutex::new(builder.build()).fuse();

    let logger = Logger::root(drain, slog::o!());
    let guard = slog_scope::set_global_logger(logger);
    slog_stdlog::init_with_level(as_log_level(level))?;

    debug!("Logging initialized at level {}", level.as_str());
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
        _ => log::Level::Error,
    }
}


#[cfg(test)]
mod tests {
    use slog::FilterLevel;
    use super::level_for;

    #[test]
    fn verbosity_levels() {
        assert_eq!(FilterLevel::Warning, level_for(0));
        assert_eq!(FilterLevel::Info, level_for(1));
        assert_eq!(FilterLevel::Trace, level_for(3));
        assert_eq!(FilterLevel::Trace, level_for(42));
        assert_eq!(FilterLevel::Error, level_for(-1));
        assert_eq!(FilterLevel::Off, level_for(-42));
    }
}
