use std::path::{Path, PathBuf};

use crate::filename::pdf_filename;
use crate::persist::{ensure_output_dir, AtomicFileWriter, PersistError};
use crate::types::JobId;

/// What the storage sink needs to know about the job whose bytes it writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    pub job_id: JobId,
    pub url: String,
}

/// Destination for rendered documents; one file per job.
pub trait Storage: Send + Sync {
    fn write(&self, job: &JobDescriptor, title: &str, bytes: &[u8]) -> Result<PathBuf, PersistError>;
}

/// Writes PDFs into a single output directory.
#[derive(Debug, Clone)]
pub struct DirectoryStorage {
    writer: AtomicFileWriter,
}

impl DirectoryStorage {
    /// Creates the directory if needed and checks it is writable.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let dir = dir.into();
        ensure_output_dir(&dir)?;
        Ok(Self {
            writer: AtomicFileWriter::new(dir),
        })
    }

    pub fn dir(&self) -> &Path {
        self.writer.dir()
    }
}

impl Storage for DirectoryStorage {
    fn write(&self, job: &JobDescriptor, title: &str, bytes: &[u8]) -> Result<PathBuf, PersistError> {
        let title = Some(title).filter(|t| !t.trim().is_empty());
        let filename = pdf_filename(job.job_id, title, &job.url);
        self.writer.write(&filename, bytes)
    }
}
