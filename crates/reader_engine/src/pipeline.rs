//! One attempt of one job, start to finish, inside a worker slot.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use engine_logging::{engine_debug, engine_warn};
use url::Url;

use crate::config::EngineConfig;
use crate::extract::Extractor;
use crate::normalize::{normalize, ExtractedArticle};
use crate::progress::ProgressSink;
use crate::render::{BackendError, RenderBackend, RenderSession};
use crate::storage::{JobDescriptor, Storage};
use crate::types::{EngineEvent, FailureKind, Job, JobError, JobStatus};

/// Slack on top of the backend's own navigation limits, in case the backend
/// itself stops responding.
const LOAD_GUARD_SLACK: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub(crate) struct PipelineContext {
    pub backend: Arc<dyn RenderBackend>,
    pub extractor: Arc<dyn Extractor>,
    pub storage: Arc<dyn Storage>,
    pub config: Arc<EngineConfig>,
    pub sink: Arc<dyn ProgressSink>,
}

/// Runs one attempt. On error the job is left in the status it failed in, so
/// the caller can decide between a retry and a terminal failure.
pub(crate) async fn run_attempt(ctx: &PipelineContext, job: &mut Job) -> Result<PathBuf, JobError> {
    let url = parse_job_url(job.url())?;

    transition(ctx, job, JobStatus::Fetching)?;
    let mut session = ctx
        .backend
        .open_session()
        .await
        .map_err(|e| JobError::new(FailureKind::Session, e.to_string()))?;

    let result = drive_session(ctx, job, &url, session.as_mut()).await;

    match tokio::time::timeout(ctx.config.close_timeout, session.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => engine_warn!(job: job.id(); "closing browser tab failed: {}", e),
        Err(_) => engine_warn!(
            job: job.id();
            "closing browser tab took longer than {:?}; abandoned",
            ctx.config.close_timeout
        ),
    }
    result
}

async fn drive_session(
    ctx: &PipelineContext,
    job: &mut Job,
    url: &Url,
    session: &mut dyn RenderSession,
) -> Result<PathBuf, JobError> {
    let config = &ctx.config;

    let load_guard =
        config.load.navigation_timeout + config.load.network_idle_grace + LOAD_GUARD_SLACK;
    let snapshot = match tokio::time::timeout(load_guard, session.load(url.as_str(), &config.load))
        .await
    {
        Err(_) => {
            return Err(JobError::new(
                FailureKind::NavigationTimeout,
                format!("no response within {load_guard:?}"),
            ))
        }
        Ok(result) => result.map_err(map_backend_error)?,
    };
    engine_debug!(job: job.id(); "loaded {} ({} bytes)", snapshot.url, snapshot.html.len());

    transition(ctx, job, JobStatus::Extracting)?;
    let extractor = ctx.extractor.clone();
    let base_url = snapshot.url.clone();
    let extraction = tokio::task::spawn_blocking(move || extractor.extract(&snapshot));
    let content = match tokio::time::timeout(config.extraction_timeout, extraction).await {
        Err(_) => {
            return Err(JobError::new(
                FailureKind::ExtractionTimeout,
                format!("extraction exceeded {:?}", config.extraction_timeout),
            ))
        }
        Ok(Err(join_err)) => {
            return Err(JobError::new(
                FailureKind::WorkerPanicked,
                format!("extractor crashed: {join_err}"),
            ))
        }
        Ok(Ok(None)) => {
            return Err(JobError::new(
                FailureKind::ExtractionEmpty,
                "no readable article content",
            ))
        }
        Ok(Ok(Some(content))) if content.is_blank() => {
            return Err(JobError::new(
                FailureKind::ExtractionEmpty,
                "article content is blank",
            ))
        }
        Ok(Ok(Some(content))) => content,
    };

    let title = content
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| fallback_title(url));
    let article = ExtractedArticle {
        title: title.clone(),
        content_html: content.content_html,
        base_url,
    };
    let document = normalize(&article)
        .map_err(|e| JobError::new(FailureKind::MalformedContent, e.to_string()))?;

    transition(ctx, job, JobStatus::Rendering)?;
    let bytes = match tokio::time::timeout(
        config.print_timeout,
        session.print_to_pdf(&document.html, &config.print),
    )
    .await
    {
        Err(_) => {
            return Err(JobError::new(
                FailureKind::RenderTimeout,
                format!("print exceeded {:?}", config.print_timeout),
            ))
        }
        Ok(Err(e)) => return Err(JobError::new(FailureKind::Render, e.to_string())),
        Ok(Ok(bytes)) if bytes.is_empty() => {
            return Err(JobError::new(FailureKind::Render, "browser returned an empty PDF"))
        }
        Ok(Ok(bytes)) => bytes,
    };

    let storage = ctx.storage.clone();
    let descriptor = JobDescriptor {
        job_id: job.id(),
        url: job.url().to_string(),
    };
    let path = tokio::task::spawn_blocking(move || storage.write(&descriptor, &title, &bytes))
        .await
        .map_err(|e| JobError::new(FailureKind::Io, format!("storage task failed: {e}")))?
        .map_err(|e| JobError::new(FailureKind::Io, e.to_string()))?;

    job.complete(path.clone())
        .map_err(|e| JobError::new(FailureKind::WorkerPanicked, e.to_string()))?;
    Ok(path)
}

fn transition(ctx: &PipelineContext, job: &mut Job, status: JobStatus) -> Result<(), JobError> {
    job.advance(status)
        .map_err(|e| JobError::new(FailureKind::WorkerPanicked, e.to_string()))?;
    ctx.sink.emit(EngineEvent::StatusChanged {
        job_id: job.id(),
        url: job.url().to_string(),
        status,
        attempt: job.attempt(),
    });
    Ok(())
}

fn parse_job_url(raw: &str) -> Result<Url, JobError> {
    let url = Url::parse(raw).map_err(|e| JobError::new(FailureKind::InvalidUrl, e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https" | "file") {
        return Err(JobError::new(
            FailureKind::InvalidUrl,
            format!("unsupported scheme {}", url.scheme()),
        ));
    }
    Ok(url)
}

fn fallback_title(url: &Url) -> String {
    url.host_str()
        .map(|h| h.trim_start_matches("www.").to_string())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "Untitled".to_string())
}

fn map_backend_error(err: BackendError) -> JobError {
    let kind = match &err {
        BackendError::NavigationTimeout(_) => FailureKind::NavigationTimeout,
        BackendError::Navigation(_) => FailureKind::Navigation,
        BackendError::Print(_) => FailureKind::Render,
        BackendError::Launch(_) | BackendError::Session(_) | BackendError::Closed => {
            FailureKind::Session
        }
    };
    JobError::new(kind, err.to_string())
}
