use std::path::Path;

use reader_core::{ActiveRowView, Outcome, Phase, ProgressView, RecentRowView};
use reader_engine::RunSummary;

use super::constants::{GLYPH_FAIL, GLYPH_OK, MAX_URL_CHARS};

/// One finished row of the scrolling tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailRow {
    pub ok: bool,
    pub text: String,
}

/// Drawing instructions for the terminal surface, derived from a view only.
#[derive(Debug, Clone, PartialEq)]
pub enum TerminalCommand {
    SetHiddenNotice(Option<String>),
    SetTail(Vec<TailRow>),
    SetActive(Vec<String>),
    SetProgress { position: u64, length: u64 },
    SetStatus(String),
}

pub fn render(view: &ProgressView) -> Vec<TerminalCommand> {
    let hidden = (view.hidden_older > 0).then(|| hidden_notice(view.hidden_older));
    vec![
        TerminalCommand::SetHiddenNotice(hidden),
        TerminalCommand::SetTail(view.recent.iter().map(tail_row).collect()),
        TerminalCommand::SetActive(view.active.iter().map(active_line).collect()),
        TerminalCommand::SetProgress {
            position: view.processed.min(view.total) as u64,
            length: view.total as u64,
        },
        TerminalCommand::SetStatus(status_line(view)),
    ]
}

pub fn hidden_notice(count: usize) -> String {
    format!("… {count} older processed entries hidden …")
}

pub fn tail_row(row: &RecentRowView) -> TailRow {
    let url = shorten(&row.url);
    match &row.outcome {
        Outcome::Done { .. } => TailRow { ok: true, text: url },
        Outcome::Failed { reason } => TailRow {
            ok: false,
            text: format!("{url}  {reason}"),
        },
    }
}

/// Plain-text form of a finished row, for logs and the non-interactive mode.
pub fn finished_line(row: &RecentRowView) -> String {
    let row = tail_row(row);
    let glyph = if row.ok { GLYPH_OK } else { GLYPH_FAIL };
    format!("{glyph} {}", row.text)
}

pub fn active_line(row: &ActiveRowView) -> String {
    let phase = phase_label(row.phase);
    let url = shorten(&row.url);
    if row.attempt > 0 {
        format!("{phase:<10} {url}  (retry {})", row.attempt)
    } else {
        format!("{phase:<10} {url}")
    }
}

pub fn status_line(view: &ProgressView) -> String {
    format!(
        "{:.0}% • {} done • {} failed • {} active",
        view.percent,
        view.completed,
        view.failed,
        view.active.len()
    )
}

pub fn summary_lines(summary: &RunSummary, out_dir: &Path, manifest: Option<&Path>) -> Vec<String> {
    let mut lines = vec![format!(
        "Processed {} URLs: {} succeeded, {} failed",
        summary.total, summary.succeeded, summary.failed
    )];
    lines.push(format!("PDFs in {}", out_dir.display()));
    if let Some(path) = manifest {
        lines.push(format!("Manifest {}", path.display()));
    }
    lines
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Pending => "queued",
        Phase::Fetching => "fetching",
        Phase::Extracting => "extracting",
        Phase::Rendering => "rendering",
    }
}

fn shorten(url: &str) -> String {
    if url.chars().count() <= MAX_URL_CHARS {
        return url.to_string();
    }
    let mut short: String = url.chars().take(MAX_URL_CHARS - 1).collect();
    short.push('…');
    short
}
