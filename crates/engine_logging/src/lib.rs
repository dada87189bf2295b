#![deny(missing_docs)]
//! Shared logging utilities for the reader2pdf workspace.
//!
//! Provides the `engine_*` logging macros used across the crates and a
//! minimal test initializer for the global logger. Each macro accepts an
//! optional `job: <id>;` prefix so per-job lines line up in the log file:
//!
//! ```
//! engine_logging::engine_info!(job: 7; "loaded {}", "https://example.com");
//! engine_logging::engine_info!("run started");
//! ```

#[doc(hidden)]
pub use log as __log;

/// Formats the prefix that tags a log line with the job it belongs to.
pub fn job_tag(job_id: u64) -> String {
    format!("[job {job_id:04}]")
}

#[doc(hidden)]
#[macro_export]
macro_rules! __engine_log {
    ($level:ident, job: $job:expr; $fmt:literal $($arg:tt)*) => {{
        $crate::__log::$level!(concat!("{} ", $fmt), $crate::job_tag($job) $($arg)*);
    }};
    ($level:ident, $($arg:tt)*) => {{
        $crate::__log::$level!($($arg)*);
    }};
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => { $crate::__engine_log!(trace, $($arg)*) };
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => { $crate::__engine_log!(info, $($arg)*) };
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => { $crate::__engine_log!(debug, $($arg)*) };
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => { $crate::__engine_log!(warn, $($arg)*) };
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => { $crate::__engine_log!(error, $($arg)*) };
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_tag_is_zero_padded() {
        assert_eq!(job_tag(7), "[job 0007]");
        assert_eq!(job_tag(12345), "[job 12345]");
    }

    #[test]
    fn macros_accept_both_forms() {
        initialize_for_tests();
        let url = "https://example.com/a";
        engine_info!(job: 3; "loaded {}", url);
        engine_debug!(job: 3; "no args");
        engine_warn!("plain {}", url);
        engine_trace!("plain");
        engine_error!(job: 1; "failed {}", url);
    }
}
