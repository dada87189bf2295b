//! Command-line surface of `reader2pdf`.
//!
//! Flags left unset fall back to the `READER2PDF_*` environment, then to the
//! optional RON config file, then to built-in defaults.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "reader2pdf",
    version,
    about = "Render a list of web pages to reader-mode PDFs with headless Chromium"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Process every URL in a list file and write one PDF per URL.
    Run(RunArgs),
    /// Check for a usable Chromium and install one when none is found.
    InstallBrowser,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Text file with one URL per line; blank lines and `#` comments are skipped.
    #[arg(short = 'i', long, env = "READER2PDF_URL_FILE")]
    pub url_file: PathBuf,

    /// Output directory [default: output].
    #[arg(short = 'o', long, env = "READER2PDF_OUT_DIR")]
    pub out_dir: Option<PathBuf>,

    /// Maximum number of pages processed at once [default: 6].
    #[arg(short = 'c', long, env = "READER2PDF_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// Extra attempts after a navigation failure [default: 2].
    #[arg(short = 'r', long, env = "READER2PDF_RETRIES")]
    pub retries: Option<u32>,

    /// Per-URL navigation timeout in seconds [default: 30].
    #[arg(long, env = "READER2PDF_TIMEOUT")]
    pub timeout: Option<u64>,

    /// RON file with engine settings; command-line flags win over it.
    #[arg(long, env = "READER2PDF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Chromium binary to launch instead of the autodetected one.
    #[arg(long, env = "READER2PDF_CHROME")]
    pub chrome: Option<PathBuf>,

    /// Number of finished URLs kept visible in the live view.
    #[arg(long, env = "READER2PDF_RECENT")]
    pub recent: Option<usize>,

    /// Disable the live view; progress goes to the log only.
    #[arg(long, env = "READER2PDF_NO_PROGRESS")]
    pub no_progress: bool,

    /// Log at debug level.
    #[arg(short, long, env = "READER2PDF_VERBOSE")]
    pub verbose: bool,
}
