use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::persist::{AtomicFileWriter, PersistError};
use crate::types::{FailureKind, JobId, RunSummary};

pub const MANIFEST_FILENAME: &str = "manifest.json";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("serialize manifest: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("persist manifest: {0}")]
    Persist(#[from] PersistError),
}

/// Machine-readable record of a run, written next to the PDFs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunManifest {
    pub generated_utc: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub jobs: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestEntry {
    pub job_id: JobId,
    pub url: String,
    pub attempts: u32,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunManifest {
    /// `generated_utc` is supplied by the caller so the engine stays clock-free.
    pub fn from_summary(summary: &RunSummary, generated_utc: impl Into<String>) -> Self {
        let jobs = summary
            .reports
            .iter()
            .map(|report| match &report.result {
                Ok(path) => ManifestEntry {
                    job_id: report.job_id,
                    url: report.url.clone(),
                    attempts: report.attempts,
                    status: "done",
                    file: path
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned()),
                    error_kind: None,
                    error: None,
                },
                Err(err) => ManifestEntry {
                    job_id: report.job_id,
                    url: report.url.clone(),
                    attempts: report.attempts,
                    status: "failed",
                    file: None,
                    error_kind: Some(err.kind),
                    error: Some(err.message.clone()),
                },
            })
            .collect();
        Self {
            generated_utc: generated_utc.into(),
            total: summary.total,
            succeeded: summary.succeeded,
            failed: summary.failed,
            jobs,
        }
    }

    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ManifestError> {
        let json = serde_json::to_vec_pretty(self)?;
        let writer = AtomicFileWriter::new(dir.to_path_buf());
        Ok(writer.write(MANIFEST_FILENAME, &json)?)
    }
}
