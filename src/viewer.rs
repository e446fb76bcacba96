use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::gallery::{
    sentinel_in_view, AdminToggle, Endpoints, Page, PaginationController, ToggleEvent,
};
use crate::session::{GallerySession, LoadState, SessionError};
use crate::transport::{self, ClientConfig, ClientError, Completion, Outcome, ReqwestTransport, Transport};
use crate::utils;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Clone, Debug)]
pub struct Options {
    pub base_url: String,
    pub app: String,
    pub poll_interval: Duration,
    pub client: ClientConfig,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/".to_string(),
            app: "turtle".to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            client: ClientConfig {
                timeout_seconds: 10,
                proxy: None,
                header: None,
            },
        }
    }
}

/// User input fed into the viewer loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Scroll(usize),
    Quit,
}

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("invalid base URL: {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

#[derive(Clone, Debug)]
pub struct ViewSummary {
    pub state: LoadState,
    pub cursor: Option<String>,
    pub rendered: usize,
    pub requests: usize,
    pub redirected: bool,
    pub elapsed: Duration,
}

/// Library entry point: a validated set of options plus the HTTP transport.
#[derive(Clone, Debug)]
pub struct Viewer {
    options: Options,
    endpoints: Endpoints,
    transport: ReqwestTransport,
}

impl Viewer {
    pub fn new(options: Options) -> Result<Self, ViewerError> {
        let base = utils::parse_base_url(&options.base_url).map_err(|message| {
            ViewerError::InvalidUrl {
                url: options.base_url.clone(),
                message,
            }
        })?;
        if options.poll_interval.is_zero() {
            return Err(ViewerError::ZeroPollInterval);
        }
        // reject a bad app before any request goes out
        GallerySession::init(&options.app)?;
        let transport = ReqwestTransport::new(&options.client)?;
        Ok(Self {
            options,
            endpoints: Endpoints::new(base),
            transport,
        })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn session(&self) -> Result<GallerySession, ViewerError> {
        Ok(GallerySession::init(&self.options.app)?)
    }

    /// Pages through the gallery until it is exhausted, the viewport is full
    /// (without `controls`), or a [`Control::Quit`] arrives.
    pub async fn run<P: Page>(
        &self,
        page: P,
        controls: Option<mpsc::Receiver<Control>>,
    ) -> Result<(P, ViewSummary), ViewerError> {
        let controller = PaginationController::new(
            self.session()?,
            self.endpoints.clone(),
            self.transport.clone(),
            page,
        );
        let (controller, summary) = drive(controller, self.options.poll_interval, controls).await;
        Ok((controller.into_page(), summary))
    }

    /// Sends each toggle, then waits for the requests to leave. Outcomes are
    /// not observed.
    pub async fn set_published(&self, events: &[ToggleEvent]) {
        let toggle = AdminToggle::new(self.endpoints.clone(), self.transport.clone());
        for event in events {
            toggle.send(event);
        }
        self.transport.drain().await;
    }
}

/// The scroll trigger: polls the controller on a fixed interval while waiting
/// for the one in-flight request and for user controls.
pub async fn drive<T: Transport, P: Page>(
    mut controller: PaginationController<T, P>,
    interval: Duration,
    mut controls: Option<mpsc::Receiver<Control>>,
) -> (PaginationController<T, P>, ViewSummary) {
    let started_at = Instant::now();
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut requests = 0usize;
    let mut in_flight = controller.request_more();
    if in_flight.is_some() {
        requests += 1;
    }

    loop {
        tokio::select! {
            outcome = wait_for(&mut in_flight) => {
                in_flight = None;
                controller.complete(outcome);
            }
            _ = ticker.tick() => {
                if in_flight.is_none() {
                    in_flight = controller.poll();
                    if in_flight.is_some() {
                        requests += 1;
                    }
                }
                if in_flight.is_none() && settled(&controller, controls.is_some()) {
                    break;
                }
            }
            control = next_control(&mut controls) => match control {
                Some(Control::Scroll(rows)) => controller.page_mut().scroll_by(rows),
                Some(Control::Quit) => {
                    debug!("quit requested");
                    break;
                }
                None => controls = None,
            }
        }
    }

    let summary = ViewSummary {
        state: controller.state(),
        cursor: controller.session().cursor().map(str::to_string),
        rendered: controller.rendered(),
        requests,
        redirected: controller.redirected(),
        elapsed: started_at.elapsed(),
    };
    info!(
        requests = summary.requests,
        rendered = summary.rendered,
        state = ?summary.state,
        "viewer stopped"
    );
    (controller, summary)
}

// Nothing more can happen once the feed is exhausted; without controls the
// viewport never moves, so a hidden sentinel is final too.
fn settled<T: Transport, P: Page>(
    controller: &PaginationController<T, P>,
    interactive: bool,
) -> bool {
    match controller.state() {
        LoadState::Exhausted => true,
        LoadState::Loading => false,
        LoadState::IdleMore => !interactive && !sentinel_in_view(controller.page().sentinel()),
    }
}

async fn wait_for(in_flight: &mut Option<Completion>) -> Outcome {
    match in_flight.as_mut() {
        Some(completion) => transport::settle(completion).await,
        None => std::future::pending().await,
    }
}

async fn next_control(controls: &mut Option<mpsc::Receiver<Control>>) -> Option<Control> {
    match controls.as_mut() {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
