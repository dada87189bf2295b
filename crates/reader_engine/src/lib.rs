//! reader2pdf engine: browser-backed extraction, normalization and PDF rendering
//! of web articles, driven by a bounded concurrent orchestrator.
mod chromium;
mod config;
mod extract;
mod filename;
mod manifest;
mod normalize;
mod orchestrator;
mod persist;
mod pipeline;
mod progress;
mod render;
mod storage;
mod types;

pub use chromium::{detect_browser, ChromiumBackend, ChromiumSettings};
pub use config::{EngineConfig, LoadOptions, PrintOptions, RetryPolicy, DEFAULT_CONCURRENCY};
pub use extract::{ExtractedContent, Extractor, ReadabilityLikeExtractor};
pub use filename::pdf_filename;
pub use manifest::{ManifestEntry, ManifestError, RunManifest, MANIFEST_FILENAME};
pub use normalize::{
    normalize, pick_srcset_candidate, ExtractedArticle, NormalizeError, NormalizedDocument,
    LAZY_SRC_ATTRS, SRCSET_ATTRS,
};
pub use orchestrator::Orchestrator;
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use progress::{ChannelProgressSink, ProgressSink};
pub use render::{BackendError, DomSnapshot, RenderBackend, RenderSession};
pub use storage::{DirectoryStorage, JobDescriptor, Storage};
pub use tokio_util::sync::CancellationToken;
pub use types::{
    EngineEvent, FailureKind, Job, JobError, JobId, JobReport, JobStatus, RunSummary,
    TransitionError,
};
