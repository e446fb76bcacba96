pub mod terminal;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::gallery::Record;
use crate::session::DisplayMode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" | "jsonl" | "ndjson" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") || lower.ends_with(".jsonl") || lower.ends_with(".ndjson") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

#[derive(Clone, Debug, Serialize)]
pub struct OutputRecord<'a> {
    pub app: &'a str,
    pub uuid: &'a str,
    pub title: &'a str,
    pub thumb: &'a str,
    pub public: bool,
    pub key: &'a str,
}

impl<'a> From<&'a Record> for OutputRecord<'a> {
    fn from(r: &'a Record) -> Self {
        Self {
            app: &r.app,
            uuid: &r.uuid,
            title: &r.title,
            thumb: &r.thumb,
            public: r.is_public,
            key: &r.key,
        }
    }
}

/// Tab-separated line; the key and publish flag are only shown to admins.
pub fn render_text(record: &Record, mode: DisplayMode) -> String {
    let title = display_title(record);
    match mode {
        DisplayMode::Public => format!("{}\t{}\t{}", record.app, record.uuid, title),
        DisplayMode::Admin => format!(
            "{}\t{}\t{}\t{}\t{}",
            record.app,
            record.uuid,
            title,
            if record.is_public { 1 } else { 0 },
            record.key
        ),
    }
}

/// One JSON object per line.
pub fn render_json(record: &Record) -> String {
    serde_json::to_string(&OutputRecord::from(record)).unwrap_or_else(|_| "{}".to_string())
}

pub fn display_title(record: &Record) -> &str {
    let title = record.title.trim();
    if title.is_empty() {
        "(untitled)"
    } else {
        title
    }
}

/// Streams rendered records to a file as they arrive.
pub struct RecordExport {
    format: OutputFormat,
    mode: DisplayMode,
    out: BufWriter<File>,
    written: usize,
}

impl RecordExport {
    pub fn create(path: &Path, format: OutputFormat, mode: DisplayMode) -> Result<Self, String> {
        let file = File::create(path)
            .map_err(|e| format!("failed to open output file '{}': {e}", path.display()))?;
        Ok(Self {
            format,
            mode,
            out: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn write(&mut self, record: &Record) -> io::Result<()> {
        let line = match self.format {
            OutputFormat::Text => render_text(record, self.mode),
            OutputFormat::Json => render_json(record),
        };
        writeln!(self.out, "{line}")?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn finish(mut self) -> io::Result<usize> {
        self.out.flush()?;
        Ok(self.written)
    }
}
