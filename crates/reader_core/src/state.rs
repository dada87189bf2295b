use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::view_model::{ActiveRowView, ProgressView, RecentRowView};

pub type JobId = u64;

/// Number of finished jobs kept in the scrolling tail unless configured otherwise.
pub const DEFAULT_RECENT_CAPACITY: usize = 12;

/// Non-terminal phase of a job as seen by the reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Pending,
    Fetching,
    Extracting,
    Rendering,
}

/// Terminal outcome of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Done { path: String },
    Failed { reason: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Done { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ActiveJob {
    pub url: String,
    pub phase: Phase,
    pub attempt: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FinishedEntry {
    pub job_id: JobId,
    pub url: String,
    pub outcome: Outcome,
}

/// Aggregate progress snapshot. Only the reporter owns one; every change goes
/// through [`crate::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressState {
    total: usize,
    completed: usize,
    failed: usize,
    in_flight: BTreeMap<JobId, ActiveJob>,
    recent: VecDeque<FinishedEntry>,
    recent_capacity: usize,
    scrolled_out: usize,
    finished_ids: BTreeSet<JobId>,
    dirty: bool,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::with_recent_capacity(DEFAULT_RECENT_CAPACITY)
    }
}

impl ProgressState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A capacity of zero is bumped to one so the tail always shows the latest result.
    pub fn with_recent_capacity(capacity: usize) -> Self {
        let recent_capacity = capacity.max(1);
        Self {
            total: 0,
            completed: 0,
            failed: 0,
            in_flight: BTreeMap::new(),
            recent: VecDeque::with_capacity(recent_capacity),
            recent_capacity,
            scrolled_out: 0,
            finished_ids: BTreeSet::new(),
            dirty: false,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Jobs that reached a terminal status, successful or not.
    pub fn processed(&self) -> usize {
        self.completed + self.failed
    }

    pub fn recent_capacity(&self) -> usize {
        self.recent_capacity
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.processed() >= self.total
    }

    /// Returns whether a redraw was pending and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn view(&self) -> ProgressView {
        let processed = self.processed();
        let percent = if self.total > 0 {
            (processed.min(self.total) as f64 / self.total as f64) * 100.0
        } else {
            0.0
        };
        ProgressView {
            total: self.total,
            completed: self.completed,
            failed: self.failed,
            processed,
            percent,
            active: self
                .in_flight
                .iter()
                .map(|(job_id, job)| ActiveRowView {
                    job_id: *job_id,
                    url: job.url.clone(),
                    phase: job.phase,
                    attempt: job.attempt,
                })
                .collect(),
            recent: self
                .recent
                .iter()
                .map(|entry| RecentRowView {
                    job_id: entry.job_id,
                    url: entry.url.clone(),
                    outcome: entry.outcome.clone(),
                })
                .collect(),
            hidden_older: self.scrolled_out,
            dirty: self.dirty,
        }
    }

    pub(crate) fn start_run(&mut self, total: usize) {
        self.total = total;
        self.mark_dirty();
    }

    pub(crate) fn apply_phase(&mut self, job_id: JobId, url: String, phase: Phase, attempt: u32) {
        if self.finished_ids.contains(&job_id) {
            return;
        }
        let next = ActiveJob {
            url,
            phase,
            attempt,
        };
        if self.in_flight.get(&job_id) == Some(&next) {
            return;
        }
        self.in_flight.insert(job_id, next);
        self.mark_dirty();
    }

    /// Returns false when the job was already finished; a second terminal
    /// report for the same job is ignored.
    pub(crate) fn apply_finished(&mut self, job_id: JobId, url: String, outcome: Outcome) -> bool {
        if !self.finished_ids.insert(job_id) {
            return false;
        }
        self.in_flight.remove(&job_id);
        if outcome.is_success() {
            self.completed += 1;
        } else {
            self.failed += 1;
        }
        // Late registration keeps the bar sane if events race ahead of RunStarted.
        if self.processed() > self.total {
            self.total = self.processed();
        }

        if self.recent.len() == self.recent_capacity {
            self.recent.pop_front();
            self.scrolled_out += 1;
        }
        self.recent.push_back(FinishedEntry {
            job_id,
            url,
            outcome,
        });
        self.mark_dirty();
        true
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}
