//! Logging module.
use std::io;

use colored::*;
use log::{Level, Log, Metadata, Record, SetLoggerError};

pub struct Logger {
    level: Level,
    target: &'static str,
}

impl Logger {
    /// Create a logger for the crates whose targets start with `target`.
    pub fn new(target: &'static str, level: Level) -> Self {
        Self { level, target }
    }

    fn is_native(&self, target: &str) -> bool {
        target.starts_with(self.target)
    }

    fn format(&self, record: &Record) -> ColoredString {
        let msg = record.args().to_string();

        if self.is_native(record.target()) {
            match record.level() {
                Level::Error => format!("== {}", msg).red().bold(),
                Level::Warn => format!("{} {}", "=>".blue(), msg).yellow(),
                Level::Info => format!("{} {}", "=>".blue(), msg.normal().bold()).normal(),
                Level::Debug => format!("{} {}", "=>".blue(), msg).dimmed(),
                Level::Trace => format!("=> {}", msg).white().dimmed(),
            }
        } else {
            let msg = format!("** {} ({})", msg, record.target());

            match record.level() {
                Level::Error => msg.red(),
                Level::Warn => msg.yellow(),
                Level::Info => msg.normal(),
                Level::Debug => msg.dimmed(),
                Level::Trace => msg.white().dimmed(),
            }
        }
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        let metadata = record.metadata();

        // When using the "info" level, ignore all logs from other targets.
        if metadata.level() == Level::Info && !self.is_native(record.target()) {
            return;
        }

        if self.enabled(metadata) {
            use std::io::Write;

            writeln!(io::stderr(), "{}", self.format(record)).ok();
        }
    }

    fn flush(&self) {}
}

/// Install the logger. Records above `Warn` are dropped until [`set_level`] is called.
pub fn init(logger: Logger) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(logger))?;
    set_level(Level::Warn);

    Ok(())
}

/// Set the maximum log level.
pub fn set_level(level: log::Level) {
    log::set_max_level(level.to_level_filter());
}
