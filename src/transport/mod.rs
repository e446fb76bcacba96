use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::join_all;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::{redirect, Method, Url};
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::utils;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

const DEFAULT_USER_AGENT: &str = concat!("galleryview/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub body: String,
}

impl Request {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            body: String::new(),
        }
    }

    /// A POST whose body is already form-urlencoded.
    pub fn post_form(url: Url, body: String) -> Self {
        Self {
            method: Method::POST,
            url,
            body,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request returned status {status}")]
    Status { status: u16, body: String },

    #[error("request failed: {message}")]
    Network { message: String },

    #[error("request was dropped before completing")]
    Dropped,
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Outcome = Result<Response, TransportError>;

/// Receives the single outcome of a request issued with [`Transport::send`].
pub type Completion = oneshot::Receiver<Outcome>;

/// Waits for a completion; a sender dropped without answering counts as a failure.
pub async fn settle(completion: &mut Completion) -> Outcome {
    completion.await.unwrap_or(Err(TransportError::Dropped))
}

pub trait Transport {
    /// Issues a request. Exactly one outcome is delivered on the returned
    /// completion: `Ok` for a 2xx response, `Err` for anything else.
    fn send(&self, request: Request) -> Completion;

    /// Issues a request and discards whatever comes back.
    fn send_detached(&self, request: Request);
}

#[derive(Clone, Debug, Default)]
pub struct ClientConfig {
    pub timeout_seconds: usize,
    pub proxy: Option<String>,
    pub header: Option<String>,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid header '{header}': {message}")]
    InvalidHeader { header: String, message: String },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },
}

pub fn build_client(config: &ClientConfig) -> Result<reqwest::Client, ClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
    if let Some(raw) = config.header.as_deref().filter(|h| !h.trim().is_empty()) {
        let (key, value) =
            utils::parse_header(raw).map_err(|message| ClientError::InvalidHeader {
                header: raw.to_string(),
                message,
            })?;
        headers.append(key, value);
    }

    let timeout = Duration::from_secs(config.timeout_seconds.try_into().unwrap_or(10));
    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .redirect(redirect::Policy::limited(10))
        .timeout(timeout);

    // only an explicitly configured proxy is used, never the environment's
    builder = match config.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
        Some(proxy) => {
            let proxy = reqwest::Proxy::all(proxy).map_err(|e| ClientError::ProxySetup {
                proxy: proxy.to_string(),
                source: e,
            })?;
            builder.proxy(proxy)
        }
        None => builder.no_proxy(),
    };

    builder
        .build()
        .map_err(|e| ClientError::HttpClientBuild { source: e })
}

/// [`Transport`] over a shared `reqwest::Client`. Requests run on spawned
/// tokio tasks, so it must be used from inside a runtime.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    detached: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        Ok(Self::with_client(build_client(config)?))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            detached: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Waits for every detached request issued so far. Their outcomes are
    /// still ignored.
    pub async fn drain(&self) {
        let pending: Vec<JoinHandle<()>> = match self.detached.lock() {
            Ok(mut handles) => handles.drain(..).collect(),
            Err(_) => return,
        };
        debug!(count = pending.len(), "waiting for detached requests");
        join_all(pending).await;
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: Request) -> Completion {
        let (tx, rx) = oneshot::channel();
        let client = self.client.clone();
        tokio::spawn(async move {
            let outcome = execute(&client, request).await;
            let _ = tx.send(outcome);
        });
        rx
    }

    fn send_detached(&self, request: Request) {
        let client = self.client.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = execute(&client, request).await {
                trace!(error = %e, "detached request failed");
            }
        });
        if let Ok(mut handles) = self.detached.lock() {
            handles.retain(|h| !h.is_finished());
            handles.push(handle);
        }
    }
}

async fn execute(client: &reqwest::Client, request: Request) -> Outcome {
    debug!(method = %request.method, url = %request.url, "sending request");
    let mut builder = client.request(request.method, request.url);
    if !request.body.is_empty() {
        builder = builder
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(request.body);
    }

    let resp = builder.send().await.map_err(|e| TransportError::Network {
        message: e.to_string(),
    })?;
    let status = resp.status();
    let body = resp.text().await.map_err(|e| TransportError::Network {
        message: e.to_string(),
    })?;

    if status.is_success() {
        Ok(Response {
            status: status.as_u16(),
            body,
        })
    } else {
        Err(TransportError::Status {
            status: status.as_u16(),
            body,
        })
    }
}
