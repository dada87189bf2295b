//! Live terminal surface built on indicatif.
//!
//! Row layout, top to bottom: the hidden-entries notice, the finished tail
//! (latest at the bottom), one spinner per in-flight job, the overall bar.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use super::constants::{GLYPH_FAIL, GLYPH_OK, SPINNER_FRAMES, SPINNER_TICK};
use super::render::{TailRow, TerminalCommand};

pub struct TerminalView {
    multi: MultiProgress,
    hidden: Option<ProgressBar>,
    tail: Vec<ProgressBar>,
    active: Vec<ProgressBar>,
    overall: ProgressBar,
}

impl TerminalView {
    pub fn new() -> Self {
        let multi = MultiProgress::new();
        let overall = multi.add(ProgressBar::new(0));
        overall.set_style(overall_style());
        overall.set_prefix("Overall");
        overall.enable_steady_tick(SPINNER_TICK);
        Self {
            multi,
            hidden: None,
            tail: Vec::new(),
            active: Vec::new(),
            overall,
        }
    }

    pub fn apply(&mut self, commands: Vec<TerminalCommand>) {
        for command in commands {
            match command {
                TerminalCommand::SetHiddenNotice(notice) => self.set_hidden(notice),
                TerminalCommand::SetTail(rows) => self.set_tail(rows),
                TerminalCommand::SetActive(lines) => self.set_active(lines),
                TerminalCommand::SetProgress { position, length } => {
                    self.overall.set_length(length);
                    self.overall.set_position(position);
                }
                TerminalCommand::SetStatus(status) => self.overall.set_message(status),
            }
        }
    }

    /// Leaves the tail and the final bar on screen and drops the spinners.
    pub fn finish(&mut self) {
        for bar in self.active.drain(..) {
            bar.finish_and_clear();
            self.multi.remove(&bar);
        }
        if let Some(hidden) = &self.hidden {
            hidden.finish();
        }
        for bar in &self.tail {
            bar.finish();
        }
        self.overall.finish();
    }

    fn set_hidden(&mut self, notice: Option<String>) {
        let Some(text) = notice else {
            if let Some(bar) = self.hidden.take() {
                bar.finish_and_clear();
                self.multi.remove(&bar);
            }
            return;
        };
        if let Some(bar) = &self.hidden {
            bar.set_message(text);
            return;
        }
        let bar = self.multi.insert(0, ProgressBar::new_spinner());
        bar.set_style(line_style("{msg:.dim}"));
        bar.set_message(text);
        self.hidden = Some(bar);
    }

    fn set_tail(&mut self, rows: Vec<TailRow>) {
        // The tail only grows: once full, rows are rewritten in place.
        let offset = usize::from(self.hidden.is_some());
        while self.tail.len() < rows.len() {
            let index = offset + self.tail.len();
            let bar = self.multi.insert(index, ProgressBar::new_spinner());
            self.tail.push(bar);
        }
        for (bar, row) in self.tail.iter().zip(rows) {
            let (glyph, template) = if row.ok {
                (GLYPH_OK, "{prefix:.green} {msg}")
            } else {
                (GLYPH_FAIL, "{prefix:.red} {msg}")
            };
            bar.set_style(line_style(template));
            bar.set_prefix(glyph);
            bar.set_message(row.text);
        }
    }

    fn set_active(&mut self, lines: Vec<String>) {
        while self.active.len() > lines.len() {
            if let Some(bar) = self.active.pop() {
                bar.finish_and_clear();
                self.multi.remove(&bar);
            }
        }
        while self.active.len() < lines.len() {
            let bar = self
                .multi
                .insert_before(&self.overall, ProgressBar::new_spinner());
            bar.set_style(spinner_style());
            bar.enable_steady_tick(SPINNER_TICK);
            self.active.push(bar);
        }
        for (bar, line) in self.active.iter().zip(lines) {
            bar.set_message(line);
        }
    }
}

fn line_style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("  {spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(SPINNER_FRAMES)
}

fn overall_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{spinner:.cyan} {prefix:.bold} [{bar:40.green/238}] {pos}/{len} processed • {msg} • \
         ⏱ {elapsed_precise} ETA {eta_precise}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("█▉▊▋▌▍▎▏  ")
    .tick_strings(SPINNER_FRAMES)
}
