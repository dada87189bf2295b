//! Bounded, order-preserving dispatch of jobs onto a worker pool.
//!
//! A single dispatcher task owns the queue and every finished [`Job`]. Workers
//! hold a semaphore permit for their whole attempt, so at most `concurrency`
//! jobs are ever in flight. Retries go back through the queue after an
//! optional backoff that does not hold a permit.

use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;

use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::extract::{Extractor, ReadabilityLikeExtractor};
use crate::pipeline::{run_attempt, PipelineContext};
use crate::progress::ProgressSink;
use crate::render::RenderBackend;
use crate::storage::Storage;
use crate::types::{
    EngineEvent, FailureKind, Job, JobError, JobId, JobReport, JobStatus, RunSummary,
};

#[derive(Debug)]
struct QueuedJob {
    job: Job,
    extraction_retries: u32,
}

enum WorkerOutcome {
    Finished {
        queued: QueuedJob,
        result: Result<PathBuf, JobError>,
    },
    Panicked {
        queued: QueuedJob,
        message: String,
    },
}

pub struct Orchestrator {
    backend: Arc<dyn RenderBackend>,
    extractor: Arc<dyn Extractor>,
    storage: Arc<dyn Storage>,
    config: Arc<EngineConfig>,
}

impl Orchestrator {
    pub fn new(
        backend: Arc<dyn RenderBackend>,
        storage: Arc<dyn Storage>,
        config: EngineConfig,
    ) -> Self {
        Self {
            backend,
            extractor: Arc::new(ReadabilityLikeExtractor),
            storage,
            config: Arc::new(config),
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Processes every URL to exactly one terminal status and returns the
    /// per-job reports in input order. Duplicate URLs become separate jobs.
    ///
    /// Cancelling `cancel` stops dispatch: queued and re-queued jobs fail as
    /// [`FailureKind::Cancelled`] while in-flight jobs run to completion.
    pub async fn run(
        &self,
        urls: Vec<String>,
        sink: Arc<dyn ProgressSink>,
        cancel: CancellationToken,
    ) -> RunSummary {
        let concurrency = self.config.effective_concurrency();
        let total = urls.len();
        engine_info!("Starting run: {} jobs, concurrency {}", total, concurrency);
        sink.emit(EngineEvent::RunStarted { total });

        let ctx = PipelineContext {
            backend: self.backend.clone(),
            extractor: self.extractor.clone(),
            storage: self.storage.clone(),
            config: self.config.clone(),
            sink: sink.clone(),
        };

        let mut ready: VecDeque<QueuedJob> = urls
            .into_iter()
            .enumerate()
            .map(|(index, url)| QueuedJob {
                job: Job::new(index as JobId + 1, url),
                extraction_retries: 0,
            })
            .collect();
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let mut workers: JoinSet<WorkerOutcome> = JoinSet::new();
        let mut backoff_timers: JoinSet<JobId> = JoinSet::new();
        let mut waiting: BTreeMap<JobId, QueuedJob> = BTreeMap::new();
        let mut reports: Vec<JobReport> = Vec::with_capacity(total);
        let mut remaining = total;
        let mut cancelled = false;

        while remaining > 0 {
            tokio::select! {
                biased;

                _ = cancel.cancelled(), if !cancelled => {
                    cancelled = true;
                    engine_warn!(
                        "Run cancelled; failing {} undispatched jobs",
                        ready.len() + waiting.len()
                    );
                    backoff_timers.abort_all();
                    let undispatched: Vec<QueuedJob> = ready
                        .drain(..)
                        .chain(std::mem::take(&mut waiting).into_values())
                        .collect();
                    for queued in undispatched {
                        let error = JobError::new(FailureKind::Cancelled, "run cancelled before dispatch");
                        reports.push(finish_failed(queued.job, error, false, sink.as_ref()));
                        remaining -= 1;
                    }
                }

                Some(joined) = workers.join_next(), if !workers.is_empty() => {
                    let outcome = match joined {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            // The wrapper task only awaits the attempt; it cannot panic itself.
                            engine_error!("worker wrapper failed: {}", e);
                            continue;
                        }
                    };
                    match self.settle(outcome, cancelled, sink.as_ref()) {
                        Settled::Terminal(report) => {
                            reports.push(report);
                            remaining -= 1;
                        }
                        Settled::Requeue(queued) => {
                            let backoff = self.config.retry.backoff;
                            if backoff.is_zero() {
                                ready.push_back(queued);
                            } else {
                                let job_id = queued.job.id();
                                waiting.insert(job_id, queued);
                                backoff_timers.spawn(async move {
                                    tokio::time::sleep(backoff).await;
                                    job_id
                                });
                            }
                        }
                    }
                }

                Some(timer) = backoff_timers.join_next(), if !backoff_timers.is_empty() => {
                    if let Ok(job_id) = timer {
                        if let Some(queued) = waiting.remove(&job_id) {
                            ready.push_back(queued);
                        }
                    }
                }

                permit = semaphore.clone().acquire_owned(), if !ready.is_empty() && !cancelled => {
                    let Ok(permit) = permit else {
                        break;
                    };
                    let Some(queued) = ready.pop_front() else {
                        continue;
                    };
                    let ctx = ctx.clone();
                    workers.spawn(async move {
                        let _permit = permit;
                        run_worker(ctx, queued).await
                    });
                }

                else => break,
            }
        }

        // Only reachable through `break` on an internal fault: nothing may stay unreported.
        for queued in ready.drain(..).chain(waiting.into_values()) {
            let error = JobError::new(FailureKind::Cancelled, "dispatcher stopped");
            reports.push(finish_failed(queued.job, error, false, sink.as_ref()));
        }

        let summary = RunSummary::from_reports(reports);
        engine_info!(
            "Run finished: {} succeeded, {} failed of {}",
            summary.succeeded,
            summary.failed,
            summary.total
        );
        sink.emit(EngineEvent::RunFinished);
        summary
    }

    fn settle(&self, outcome: WorkerOutcome, cancelled: bool, sink: &dyn ProgressSink) -> Settled {
        let (mut queued, result) = match outcome {
            WorkerOutcome::Finished { queued, result } => (queued, result),
            WorkerOutcome::Panicked { queued, message } => {
                engine_error!(job: queued.job.id(); "worker panicked: {}", message);
                let error = JobError::new(FailureKind::WorkerPanicked, message);
                return Settled::Terminal(finish_failed(queued.job, error, true, sink));
            }
        };

        let error = match result {
            Ok(path) => {
                let job = queued.job;
                engine_info!(job: job.id(); "done -> {}", path.display());
                sink.emit(EngineEvent::JobFinished {
                    job_id: job.id(),
                    url: job.url().to_string(),
                    result: Ok(path.clone()),
                });
                return Settled::Terminal(JobReport {
                    job_id: job.id(),
                    url: job.url().to_string(),
                    attempts: job.attempt() + 1,
                    result: Ok(path),
                });
            }
            Err(error) => error,
        };

        let attempts_made = queued.job.attempt() + 1;
        let retry = !cancelled
            && self
                .config
                .retry
                .should_retry(error.kind, attempts_made, queued.extraction_retries);
        if retry && queued.job.requeue().is_ok() {
            if error.kind == FailureKind::ExtractionTimeout {
                queued.extraction_retries += 1;
            }
            engine_warn!(
                job: queued.job.id();
                "attempt {} failed ({}), re-queued",
                attempts_made,
                error
            );
            sink.emit(EngineEvent::StatusChanged {
                job_id: queued.job.id(),
                url: queued.job.url().to_string(),
                status: JobStatus::Pending,
                attempt: queued.job.attempt(),
            });
            return Settled::Requeue(queued);
        }

        Settled::Terminal(finish_failed(queued.job, error, true, sink))
    }
}

enum Settled {
    Terminal(JobReport),
    Requeue(QueuedJob),
}

/// Runs the attempt in its own task so a panic is contained to this job.
async fn run_worker(ctx: PipelineContext, queued: QueuedJob) -> WorkerOutcome {
    let snapshot = QueuedJob {
        job: queued.job.clone(),
        extraction_retries: queued.extraction_retries,
    };
    let attempt = tokio::spawn(async move {
        let mut queued = queued;
        let result = run_attempt(&ctx, &mut queued.job).await;
        (queued, result)
    });
    match attempt.await {
        Ok((queued, result)) => WorkerOutcome::Finished { queued, result },
        Err(join_err) => WorkerOutcome::Panicked {
            queued: snapshot,
            message: panic_message(join_err),
        },
    }
}

fn panic_message(err: tokio::task::JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// `attempted` tells whether the failing attempt counts; jobs cancelled
/// before dispatch report only the attempts they actually made.
fn finish_failed(mut job: Job, error: JobError, attempted: bool, sink: &dyn ProgressSink) -> JobReport {
    if let Err(e) = job.fail(error.clone()) {
        engine_debug!(job: job.id(); "fail transition rejected: {}", e);
    }
    engine_warn!(job: job.id(); "failed: {}", error);
    sink.emit(EngineEvent::JobFinished {
        job_id: job.id(),
        url: job.url().to_string(),
        result: Err(error.clone()),
    });
    JobReport {
        job_id: job.id(),
        url: job.url().to_string(),
        attempts: job.attempt() + u32::from(attempted),
        result: Err(error),
    }
}
