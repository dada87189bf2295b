//! Run settings: optional RON file merged under command-line flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use engine_logging::engine_info;
use reader_core::DEFAULT_RECENT_CAPACITY;
use reader_engine::{ChromiumSettings, EngineConfig};
use serde::{Deserialize, Serialize};

use crate::cli::RunArgs;

const DEFAULT_OUT_DIR: &str = "output";

/// Contents of a `--config` file. Every field is optional.
///
/// ```ron
/// (
///     concurrency: Some(4),
///     retries: Some(1),
///     navigation_timeout_secs: Some(45),
///     paper: Some((width_mm: 216.0, height_mm: 279.0)),
/// )
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub out_dir: Option<PathBuf>,
    pub concurrency: Option<usize>,
    pub retries: Option<u32>,
    pub backoff_ms: Option<u64>,
    pub navigation_timeout_secs: Option<u64>,
    pub network_idle_grace_secs: Option<u64>,
    pub extraction_timeout_secs: Option<u64>,
    pub print_timeout_secs: Option<u64>,
    pub recent: Option<usize>,
    pub chrome: Option<PathBuf>,
    pub chrome_args: Vec<String>,
    pub paper: Option<PaperConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaperConfig {
    pub width_mm: Option<f64>,
    pub height_mm: Option<f64>,
    pub margin_vertical_mm: Option<f64>,
    pub margin_horizontal_mm: Option<f64>,
    pub print_background: Option<bool>,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = ron::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        engine_info!("Loaded config from {:?}", path);
        Ok(config)
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub url_file: PathBuf,
    pub out_dir: PathBuf,
    pub engine: EngineConfig,
    pub chromium: ChromiumSettings,
    pub recent: usize,
    pub live_view: bool,
    pub verbose: bool,
}

impl RunSettings {
    /// Flags win over the file; the file wins over defaults.
    pub fn resolve(args: &RunArgs, file: AppConfig) -> Self {
        let mut engine = EngineConfig::default();

        if let Some(concurrency) = args.concurrency.or(file.concurrency) {
            engine.concurrency = concurrency;
        }
        if let Some(retries) = args.retries.or(file.retries) {
            engine.retry.max_attempts = retries.saturating_add(1);
        }
        if let Some(ms) = file.backoff_ms {
            engine.retry.backoff = Duration::from_millis(ms);
        }
        if let Some(secs) = args.timeout.or(file.navigation_timeout_secs) {
            engine.load.navigation_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = file.network_idle_grace_secs {
            engine.load.network_idle_grace = Duration::from_secs(secs);
        }
        if let Some(secs) = file.extraction_timeout_secs {
            engine.extraction_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = file.print_timeout_secs {
            engine.print_timeout = Duration::from_secs(secs);
        }
        if let Some(paper) = file.paper {
            let print = &mut engine.print;
            print.paper_width_mm = paper.width_mm.unwrap_or(print.paper_width_mm);
            print.paper_height_mm = paper.height_mm.unwrap_or(print.paper_height_mm);
            print.margin_vertical_mm = paper.margin_vertical_mm.unwrap_or(print.margin_vertical_mm);
            print.margin_horizontal_mm =
                paper.margin_horizontal_mm.unwrap_or(print.margin_horizontal_mm);
            print.print_background = paper.print_background.unwrap_or(print.print_background);
        }

        Self {
            url_file: args.url_file.clone(),
            out_dir: args
                .out_dir
                .clone()
                .or(file.out_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR)),
            engine,
            chromium: ChromiumSettings {
                executable: args.chrome.clone().or(file.chrome),
                extra_args: file.chrome_args,
            },
            recent: args.recent.or(file.recent).unwrap_or(DEFAULT_RECENT_CAPACITY),
            live_view: !args.no_progress,
            verbose: args.verbose,
        }
    }
}
