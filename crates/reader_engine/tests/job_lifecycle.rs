use std::path::PathBuf;

use pretty_assertions::assert_eq;
use reader_engine::{FailureKind, Job, JobError, JobStatus, TransitionError};

#[test]
fn new_job_is_pending_and_trimmed() {
    let job = Job::new(1, "  https://example.com/a \n");
    assert_eq!(job.url(), "https://example.com/a");
    assert_eq!(job.status(), JobStatus::Pending);
    assert_eq!(job.attempt(), 0);
    assert!(job.error().is_none());
    assert!(job.output_path().is_none());
}

#[test]
fn happy_path_moves_strictly_forward() {
    let mut job = Job::new(1, "https://example.com/a");
    job.advance(JobStatus::Fetching).unwrap();
    job.advance(JobStatus::Extracting).unwrap();
    job.advance(JobStatus::Rendering).unwrap();
    job.complete(PathBuf::from("out/a.pdf")).unwrap();

    assert_eq!(job.status(), JobStatus::Done);
    assert_eq!(job.output_path(), Some(&PathBuf::from("out/a.pdf")));
}

#[test]
fn skipping_a_status_is_rejected() {
    let mut job = Job::new(4, "https://example.com/a");
    let err = job.advance(JobStatus::Rendering).unwrap_err();
    assert_eq!(
        err,
        TransitionError {
            job_id: 4,
            from: JobStatus::Pending,
            to: JobStatus::Rendering,
        }
    );
    assert_eq!(job.status(), JobStatus::Pending);
}

#[test]
fn done_requires_rendering() {
    let mut job = Job::new(1, "https://example.com/a");
    job.advance(JobStatus::Fetching).unwrap();
    assert!(job.complete(PathBuf::from("x.pdf")).is_err());
    assert!(job.advance(JobStatus::Done).is_err());
}

#[test]
fn failure_is_terminal() {
    let mut job = Job::new(1, "https://example.com/a");
    job.advance(JobStatus::Fetching).unwrap();
    job.fail(JobError::new(FailureKind::Navigation, "refused")).unwrap();

    assert_eq!(job.status(), JobStatus::Failed);
    assert_eq!(job.error().map(|e| e.kind), Some(FailureKind::Navigation));
    assert!(job.fail(JobError::new(FailureKind::Io, "again")).is_err());
    assert!(job.requeue().is_err());
    assert!(job.advance(JobStatus::Extracting).is_err());
}

#[test]
fn requeue_resets_to_pending_and_counts_attempts() {
    let mut job = Job::new(1, "https://example.com/a");
    job.advance(JobStatus::Fetching).unwrap();
    job.requeue().unwrap();
    assert_eq!(job.status(), JobStatus::Pending);
    assert_eq!(job.attempt(), 1);

    // A pending job has nothing to retry.
    assert!(job.requeue().is_err());
}

#[test]
fn error_display_includes_kind_and_message() {
    let err = JobError::new(FailureKind::RenderTimeout, "print exceeded 60s");
    assert_eq!(err.to_string(), "print timeout: print exceeded 60s");
    assert_eq!(JobError::new(FailureKind::Cancelled, "").to_string(), "cancelled");
}
