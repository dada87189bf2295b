use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

pub type JobId = u64;

/// Lifecycle status of a [`Job`]. Only the worker owning the job moves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Fetching,
    Extracting,
    Rendering,
    Done,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }

    /// Statuses that occupy a worker slot.
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            JobStatus::Fetching | JobStatus::Extracting | JobStatus::Rendering
        )
    }

    fn next(self) -> Option<JobStatus> {
        match self {
            JobStatus::Pending => Some(JobStatus::Fetching),
            JobStatus::Fetching => Some(JobStatus::Extracting),
            JobStatus::Extracting => Some(JobStatus::Rendering),
            JobStatus::Rendering => Some(JobStatus::Done),
            JobStatus::Done | JobStatus::Failed => None,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            JobStatus::Pending => "pending",
            JobStatus::Fetching => "fetching",
            JobStatus::Extracting => "extracting",
            JobStatus::Rendering => "rendering",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidUrl,
    Navigation,
    NavigationTimeout,
    ExtractionEmpty,
    ExtractionTimeout,
    MalformedContent,
    Render,
    RenderTimeout,
    Io,
    Session,
    Cancelled,
    WorkerPanicked,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::InvalidUrl => "invalid url",
            FailureKind::Navigation => "navigation error",
            FailureKind::NavigationTimeout => "navigation timeout",
            FailureKind::ExtractionEmpty => "no readable content",
            FailureKind::ExtractionTimeout => "extraction timeout",
            FailureKind::MalformedContent => "malformed content",
            FailureKind::Render => "render error",
            FailureKind::RenderTimeout => "print timeout",
            FailureKind::Io => "io error",
            FailureKind::Session => "browser session error",
            FailureKind::Cancelled => "cancelled",
            FailureKind::WorkerPanicked => "worker panicked",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobError {
    pub kind: FailureKind,
    pub message: String,
}

impl JobError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for JobError {}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal transition for job {job_id}: {from} -> {to}")]
pub struct TransitionError {
    pub job_id: JobId,
    pub from: JobStatus,
    pub to: JobStatus,
}

/// One requested conversion unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    id: JobId,
    url: String,
    status: JobStatus,
    attempt: u32,
    error: Option<JobError>,
    output_path: Option<PathBuf>,
}

impl Job {
    pub fn new(id: JobId, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into().trim().to_string(),
            status: JobStatus::Pending,
            attempt: 0,
            error: None,
            output_path: None,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn error(&self) -> Option<&JobError> {
        self.error.as_ref()
    }

    pub fn output_path(&self) -> Option<&PathBuf> {
        self.output_path.as_ref()
    }

    /// Moves one step forward. `Done` is only reachable through [`Job::complete`].
    pub fn advance(&mut self, to: JobStatus) -> Result<(), TransitionError> {
        if to == JobStatus::Done || to == JobStatus::Failed || self.status.next() != Some(to) {
            return Err(self.illegal(to));
        }
        self.status = to;
        Ok(())
    }

    pub fn complete(&mut self, output_path: PathBuf) -> Result<(), TransitionError> {
        if self.status != JobStatus::Rendering {
            return Err(self.illegal(JobStatus::Done));
        }
        self.status = JobStatus::Done;
        self.output_path = Some(output_path);
        Ok(())
    }

    /// Any non-terminal job may fail.
    pub fn fail(&mut self, error: JobError) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(self.illegal(JobStatus::Failed));
        }
        self.status = JobStatus::Failed;
        self.error = Some(error);
        Ok(())
    }

    /// The single backward move: back to `Pending` with the attempt counter bumped.
    pub fn requeue(&mut self) -> Result<(), TransitionError> {
        if self.status.is_terminal() || self.status == JobStatus::Pending {
            return Err(self.illegal(JobStatus::Pending));
        }
        self.status = JobStatus::Pending;
        self.attempt += 1;
        Ok(())
    }

    fn illegal(&self, to: JobStatus) -> TransitionError {
        TransitionError {
            job_id: self.id,
            from: self.status,
            to,
        }
    }
}

/// Progress events emitted by the orchestrator, one per status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    RunStarted {
        total: usize,
    },
    StatusChanged {
        job_id: JobId,
        url: String,
        status: JobStatus,
        attempt: u32,
    },
    JobFinished {
        job_id: JobId,
        url: String,
        result: Result<PathBuf, JobError>,
    },
    RunFinished,
}

/// Per-job line of a [`RunSummary`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub job_id: JobId,
    pub url: String,
    /// Attempts made, counting the first one.
    pub attempts: u32,
    pub result: Result<PathBuf, JobError>,
}

impl JobReport {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// One report per job, in input order.
    pub reports: Vec<JobReport>,
}

impl RunSummary {
    pub fn from_reports(mut reports: Vec<JobReport>) -> Self {
        reports.sort_by_key(|report| report.job_id);
        let succeeded = reports.iter().filter(|r| r.is_success()).count();
        Self {
            total: reports.len(),
            succeeded,
            failed: reports.len() - succeeded,
            reports,
        }
    }
}
