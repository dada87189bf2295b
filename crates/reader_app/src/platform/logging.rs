//! simplelog setup for reader2pdf.
//!
//! The run log always goes to `./reader2pdf.log`; the terminal only gets log
//! lines when the live view is off.

use std::fs::File;
use std::path::Path;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

const LOG_FILE: &str = "./reader2pdf.log";

/// Where log records end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogDestination {
    File,
    Terminal,
    Both,
}

impl LogDestination {
    /// The live view owns the terminal; log lines there would tear it.
    pub fn for_run(live_view: bool) -> Self {
        if live_view {
            LogDestination::File
        } else {
            LogDestination::Both
        }
    }

    fn to_file(self) -> bool {
        matches!(self, LogDestination::File | LogDestination::Both)
    }

    fn to_terminal(self) -> bool {
        matches!(self, LogDestination::Terminal | LogDestination::Both)
    }
}

pub fn level_for(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Installs the global logger. A second call is a no-op; a log file that
/// cannot be created only costs the file sink.
pub fn initialize(destination: LogDestination, verbose: bool) {
    let level = level_for(verbose);
    let config = record_config();
    let mut sinks: Vec<Box<dyn SharedLogger>> = Vec::new();

    if destination.to_terminal() {
        sinks.push(TermLogger::new(
            level,
            config.clone(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ));
    }
    if destination.to_file() {
        if let Some(sink) = file_sink(Path::new(LOG_FILE), level, config) {
            sinks.push(sink);
        }
    }

    if !sinks.is_empty() {
        let _ = CombinedLogger::init(sinks);
    }
}

fn record_config() -> Config {
    // chromiumoxide reports every CDP message it cannot parse.
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .add_filter_ignore_str("chromiumoxide")
        .add_filter_ignore_str("tungstenite")
        .build()
}

fn file_sink(path: &Path, level: LevelFilter, config: Config) -> Option<Box<dyn SharedLogger>> {
    match File::create(path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("reader2pdf: cannot create log file {}: {err}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_view_keeps_logs_off_the_terminal() {
        assert_eq!(LogDestination::for_run(true), LogDestination::File);
        assert!(!LogDestination::for_run(true).to_terminal());
        assert!(LogDestination::for_run(false).to_terminal());
        assert!(LogDestination::for_run(false).to_file());
    }

    #[test]
    fn verbose_raises_level() {
        assert_eq!(level_for(false), LevelFilter::Info);
        assert_eq!(level_for(true), LevelFilter::Debug);
    }
}
