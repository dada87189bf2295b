use crate::{JobId, Outcome, Phase};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressView {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub processed: usize,
    pub percent: f64,
    pub active: Vec<ActiveRowView>,
    /// Finished jobs in completion order, most recent last.
    pub recent: Vec<RecentRowView>,
    /// Finished jobs that scrolled out of the tail.
    pub hidden_older: usize,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRowView {
    pub job_id: JobId,
    pub url: String,
    pub phase: Phase,
    pub attempt: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentRowView {
    pub job_id: JobId,
    pub url: String,
    pub outcome: Outcome,
}
