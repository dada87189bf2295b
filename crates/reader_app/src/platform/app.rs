use std::fs;
use std::process::Command;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use engine_logging::{engine_error, engine_info, engine_warn};
use reader_core::parse_url_lines;
use reader_engine::{
    detect_browser, CancellationToken, ChannelProgressSink, ChromiumBackend, DirectoryStorage,
    Orchestrator, RenderBackend, RunManifest,
};
use tokio::sync::mpsc;

use super::config::{AppConfig, RunSettings};
use super::logging::{self, LogDestination};
use super::reporter::spawn_reporter;
use super::ui::render::summary_lines;
use crate::cli::RunArgs;

const INSTALLER: &[&str] = &["npx", "--yes", "@puppeteer/browsers", "install", "chrome@stable"];

/// Runs one batch. Errors are returned only when the run cannot start;
/// failed URLs are reported in the summary and the manifest instead.
pub fn run_app(args: RunArgs) -> Result<()> {
    let file_config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    let settings = RunSettings::resolve(&args, file_config);
    logging::initialize(LogDestination::for_run(settings.live_view), settings.verbose);

    let raw = fs::read_to_string(&settings.url_file)
        .with_context(|| format!("reading URL file {}", settings.url_file.display()))?;
    let urls = parse_url_lines(&raw);
    engine_info!("Read {} URLs from {:?}", urls.len(), settings.url_file);

    let storage = Arc::new(
        DirectoryStorage::open(&settings.out_dir)
            .with_context(|| format!("preparing output directory {}", settings.out_dir.display()))?,
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;

    runtime.block_on(async move {
        let backend = ChromiumBackend::launch(&settings.chromium)
            .await
            .context("launching Chromium (try `reader2pdf install-browser`)")?;

        let (tx, rx) = mpsc::unbounded_channel();
        let reporter = spawn_reporter(rx, settings.recent, settings.live_view);
        let sink = Arc::new(ChannelProgressSink::new(tx));

        let cancel = CancellationToken::new();
        let interrupt = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    engine_warn!("Interrupted; letting in-flight pages finish");
                    cancel.cancel();
                }
            })
        };

        let orchestrator = Orchestrator::new(backend.clone(), storage.clone(), settings.engine);
        let summary = orchestrator.run(urls, sink, cancel).await;
        interrupt.abort();

        if let Err(e) = reporter.await {
            engine_error!("progress reporter stopped abnormally: {}", e);
        }
        if let Err(e) = backend.shutdown().await {
            engine_warn!("browser shutdown: {}", e);
        }

        let manifest = RunManifest::from_summary(&summary, Utc::now().to_rfc3339());
        let manifest_path = match manifest.write_to(storage.dir()) {
            Ok(path) => Some(path),
            Err(e) => {
                engine_error!("writing run manifest: {}", e);
                None
            }
        };

        for line in summary_lines(&summary, storage.dir(), manifest_path.as_deref()) {
            println!("{line}");
        }
        Ok(())
    })
}

/// Reports an already usable browser, otherwise runs the Chromium installer.
pub fn install_browser() -> Result<()> {
    logging::initialize(LogDestination::Terminal, false);

    match detect_browser() {
        Ok(()) => {
            println!("A Chromium browser is already available.");
            return Ok(());
        }
        Err(e) => engine_info!("No browser detected: {}", e),
    }

    println!("Installing Chromium with `{}`", INSTALLER.join(" "));
    let status = Command::new(INSTALLER[0])
        .args(&INSTALLER[1..])
        .status()
        .context("running the browser installer (needs Node.js; alternatively set READER2PDF_CHROME)")?;
    if !status.success() {
        bail!("browser installer failed with {status}");
    }
    println!("Chromium installed. Set READER2PDF_CHROME to the printed path if it is not found automatically.");
    Ok(())
}
