use std::io::{self, Write};
use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use reqwest::Url;
use tracing::warn;

use super::{display_title, RecordExport};
use crate::gallery::{Page, Record, RecordRenderer, SentinelProbe};
use crate::session::DisplayMode;

/// Terminal rendition of the gallery page.
///
/// Each record takes one row; the sentinel is the row after the last one.
/// The viewport is `viewport_rows` tall (unbounded when `None`) and starts at
/// row `scrolled`.
pub struct TerminalPage<W: Write> {
    out: W,
    mode: DisplayMode,
    viewport_rows: Option<usize>,
    rows_rendered: usize,
    scrolled: usize,
    show_spinner: bool,
    spinner: Option<ProgressBar>,
    redirected_to: Option<Url>,
    export: Option<RecordExport>,
    write_failed: bool,
}

impl TerminalPage<io::Stdout> {
    pub fn stdout(mode: DisplayMode, viewport_rows: Option<usize>) -> Self {
        Self::new(io::stdout(), mode, viewport_rows).with_spinner(true)
    }
}

impl<W: Write> TerminalPage<W> {
    pub fn new(out: W, mode: DisplayMode, viewport_rows: Option<usize>) -> Self {
        Self {
            out,
            mode,
            viewport_rows,
            rows_rendered: 0,
            scrolled: 0,
            show_spinner: false,
            spinner: None,
            redirected_to: None,
            export: None,
            write_failed: false,
        }
    }

    pub fn with_spinner(mut self, enable: bool) -> Self {
        self.show_spinner = enable;
        self
    }

    pub fn with_export(mut self, export: RecordExport) -> Self {
        self.export = Some(export);
        self
    }

    pub fn rows_rendered(&self) -> usize {
        self.rows_rendered
    }

    pub fn redirected_to(&self) -> Option<&Url> {
        self.redirected_to.as_ref()
    }

    /// Clears the indicator and flushes everything. Returns how many records
    /// went to the export file, if there is one.
    pub fn finish(&mut self) -> io::Result<Option<usize>> {
        self.stop_spinner();
        self.out.flush()?;
        match self.export.take() {
            Some(export) => export.finish().map(Some),
            None => Ok(None),
        }
    }

    pub fn into_writer(self) -> W {
        self.out
    }

    fn format_row(&self, record: &Record) -> String {
        let index = format!("{:>4}", self.rows_rendered + 1).dimmed();
        let app = format!("[{}]", record.app).cyan();
        let title = display_title(record).bold().white();
        match self.mode {
            DisplayMode::Public => format!("{index} {app} {title} {}", record.uuid.dimmed()),
            DisplayMode::Admin => {
                let mark = if record.is_public {
                    "[x]".green()
                } else {
                    "[ ]".yellow()
                };
                format!(
                    "{index} {mark} {app} {title} {} {}",
                    record.uuid.dimmed(),
                    format!("key={}", record.key).dimmed()
                )
            }
        }
    }

    fn write_line(&mut self, line: &str) {
        let out = &mut self.out;
        let result = match self.spinner.as_ref() {
            Some(pb) => pb.suspend(|| writeln!(out, "{line}")),
            None => writeln!(out, "{line}"),
        };
        if let Err(e) = result {
            if !self.write_failed {
                warn!(error = %e, "failed to write to terminal");
                self.write_failed = true;
            }
        }
    }

    fn start_spinner(&mut self) {
        if !self.show_spinner || self.spinner.is_some() {
            return;
        }
        let pb = ProgressBar::new_spinner();
        pb.set_draw_target(ProgressDrawTarget::stderr());
        if let Ok(style) = ProgressStyle::with_template(":: {spinner} Loading :: {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("{} records so far", self.rows_rendered));
        pb.enable_steady_tick(Duration::from_millis(120));
        self.spinner = Some(pb);
    }

    fn stop_spinner(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }
}

impl<W: Write> RecordRenderer for TerminalPage<W> {
    fn render(&mut self, record: Record) {
        let row = self.format_row(&record);
        self.write_line(&row);
        if let Some(export) = self.export.as_mut() {
            if let Err(e) = export.write(&record) {
                warn!(error = %e, "failed to write record to output file");
            }
        }
        self.rows_rendered += 1;
    }
}

impl<W: Write> Page for TerminalPage<W> {
    fn set_loading(&mut self, visible: bool) {
        if visible {
            self.start_spinner();
        } else {
            self.stop_spinner();
        }
    }

    fn redirect(&mut self, location: &Url) {
        self.stop_spinner();
        let line = format!(
            "{} {}",
            ":: Login required :: sign in at".bold().yellow(),
            location.as_str()
        );
        self.write_line(&line);
        self.redirected_to = Some(location.clone());
    }

    fn sentinel(&self) -> SentinelProbe {
        SentinelProbe {
            sentinel_top: self.rows_rendered as f64 - self.scrolled as f64,
            viewport_height: self
                .viewport_rows
                .map(|rows| rows as f64)
                .unwrap_or(f64::INFINITY),
        }
    }

    fn scroll_by(&mut self, rows: usize) {
        self.scrolled = (self.scrolled + rows).min(self.rows_rendered);
    }
}
