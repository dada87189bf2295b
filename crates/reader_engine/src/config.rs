use std::time::Duration;

use crate::types::FailureKind;

pub const DEFAULT_CONCURRENCY: usize = 6;

/// Browser-side load behaviour for one navigation.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    /// Hard limit for reaching DOM-ready.
    pub navigation_timeout: Duration,
    /// Soft limit for waiting on network quiescence after DOM-ready.
    pub network_idle_grace: Duration,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(30),
            network_idle_grace: Duration::from_secs(10),
        }
    }
}

/// Page geometry for printing, in millimetres.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintOptions {
    pub paper_width_mm: f64,
    pub paper_height_mm: f64,
    pub margin_vertical_mm: f64,
    pub margin_horizontal_mm: f64,
    pub print_background: bool,
}

impl PrintOptions {
    pub fn a4() -> Self {
        Self {
            paper_width_mm: 210.0,
            paper_height_mm: 297.0,
            margin_vertical_mm: 15.0,
            margin_horizontal_mm: 12.0,
            print_background: true,
        }
    }
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self::a4()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts allowed for navigation failures, counting the first.
    pub max_attempts: u32,
    /// Delay before a re-queued job becomes eligible for dispatch again.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Decides whether a failed attempt goes back to the queue.
    ///
    /// `attempts_made` counts the attempt that just failed; `extraction_retries`
    /// is how many times this job was already re-queued for an extraction timeout.
    pub fn should_retry(&self, kind: FailureKind, attempts_made: u32, extraction_retries: u32) -> bool {
        match kind {
            FailureKind::Navigation | FailureKind::NavigationTimeout => {
                attempts_made < self.max_attempts
            }
            FailureKind::ExtractionTimeout => extraction_retries == 0,
            _ => false,
        }
    }
}

/// Everything the orchestrator needs besides its collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub concurrency: usize,
    pub load: LoadOptions,
    pub extraction_timeout: Duration,
    pub print_timeout: Duration,
    pub print: PrintOptions,
    pub retry: RetryPolicy,
    /// Upper bound on closing a tab; past it the session is dropped.
    pub close_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            load: LoadOptions::default(),
            extraction_timeout: Duration::from_secs(20),
            print_timeout: Duration::from_secs(60),
            print: PrintOptions::default(),
            retry: RetryPolicy::default(),
            close_timeout: Duration::from_secs(10),
        }
    }
}

impl EngineConfig {
    /// Concurrency below one would stall the pool.
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }
}
