use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::Arc;

use reqwest::Url;
use tokio::sync::{oneshot, Notify};

use crate::gallery::{Page, Record, RecordRenderer, SentinelProbe};
use crate::transport::{Completion, Outcome, Request, Response, Transport};

/// Records every request. Replies come from `script` in order; when the
/// script runs dry the completion is left pending.
#[derive(Default)]
pub struct RecordingTransport {
    sent: RefCell<Vec<Request>>,
    detached: RefCell<Vec<Request>>,
    script: RefCell<VecDeque<Outcome>>,
    pending: RefCell<Vec<oneshot::Sender<Outcome>>>,
}

impl RecordingTransport {
    pub fn scripted(outcomes: Vec<Outcome>) -> Self {
        Self {
            script: RefCell::new(outcomes.into()),
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<Request> {
        self.sent.borrow().clone()
    }

    pub fn detached(&self) -> Vec<Request> {
        self.detached.borrow().clone()
    }
}

impl Transport for RecordingTransport {
    fn send(&self, request: Request) -> Completion {
        self.sent.borrow_mut().push(request);
        let (tx, rx) = oneshot::channel();
        match self.script.borrow_mut().pop_front() {
            Some(outcome) => {
                let _ = tx.send(outcome);
            }
            None => self.pending.borrow_mut().push(tx),
        }
        rx
    }

    fn send_detached(&self, request: Request) {
        self.detached.borrow_mut().push(request);
    }
}

/// Page double. With `rows` set, the sentinel sits below the rendered
/// records the way the terminal page does; otherwise `probe` is returned.
#[derive(Default)]
pub struct RecordingPage {
    pub records: Vec<Record>,
    pub loading: bool,
    pub loading_changes: Vec<bool>,
    pub redirects: Vec<String>,
    pub probe: SentinelProbe,
    pub rows: Option<usize>,
    pub scrolled: usize,
    /// Notified after every rendered record.
    pub rendered: Option<Arc<Notify>>,
}

impl RecordingPage {
    pub fn with_rows(rows: usize) -> Self {
        Self {
            rows: Some(rows),
            ..Default::default()
        }
    }
}

impl RecordRenderer for RecordingPage {
    fn render(&mut self, record: Record) {
        self.records.push(record);
        if let Some(rendered) = self.rendered.as_ref() {
            rendered.notify_one();
        }
    }
}

impl Page for RecordingPage {
    fn set_loading(&mut self, visible: bool) {
        self.loading = visible;
        self.loading_changes.push(visible);
    }

    fn redirect(&mut self, location: &Url) {
        self.redirects.push(location.to_string());
    }

    fn sentinel(&self) -> SentinelProbe {
        match self.rows {
            Some(rows) => SentinelProbe {
                sentinel_top: self.records.len() as f64 - self.scrolled as f64,
                viewport_height: rows as f64,
            },
            None => self.probe,
        }
    }

    fn scroll_by(&mut self, rows: usize) {
        self.scrolled = (self.scrolled + rows).min(self.records.len());
    }
}

pub fn record(key: &str) -> Record {
    Record {
        app: "turtle".to_string(),
        uuid: format!("uuid-{key}"),
        thumb: String::new(),
        title: format!("Art {key}"),
        is_public: true,
        key: key.to_string(),
    }
}

pub fn page_json(more: bool, cursor: Option<&str>, data: &[Record]) -> String {
    serde_json::json!({
        "more": more,
        "cursor": cursor,
        "data": data,
    })
    .to_string()
}

pub fn ok_body(body: &str) -> Outcome {
    Ok(Response {
        status: 200,
        body: body.to_string(),
    })
}
