use reqwest::StatusCode;
use tracing::{debug, trace, warn};

use super::{sentinel_in_view, Endpoints, Page, SentinelProbe, ViewPage};
use crate::session::{GallerySession, LoadOutcome, LoadState};
use crate::transport::{Completion, Outcome, Request, Transport, TransportError};

/// Drives incremental loading for one gallery session.
///
/// Every request goes out through `request_more`, which refuses to issue a
/// second fetch while one is in flight and never fetches again once the feed
/// is exhausted. The caller waits on the returned [`Completion`] and hands the
/// outcome back to [`PaginationController::complete`].
pub struct PaginationController<T, P> {
    session: GallerySession,
    endpoints: Endpoints,
    transport: T,
    page: P,
    rendered: usize,
    redirected: bool,
}

impl<T: Transport, P: Page> PaginationController<T, P> {
    pub fn new(session: GallerySession, endpoints: Endpoints, transport: T, page: P) -> Self {
        Self {
            session,
            endpoints,
            transport,
            page,
            rendered: 0,
            redirected: false,
        }
    }

    pub fn session(&self) -> &GallerySession {
        &self.session
    }

    pub fn state(&self) -> LoadState {
        self.session.state()
    }

    /// Records handed to the page so far.
    pub fn rendered(&self) -> usize {
        self.rendered
    }

    pub fn redirected(&self) -> bool {
        self.redirected
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    pub fn into_page(self) -> P {
        self.page
    }

    /// Fetches the next batch unless one is already loading or nothing is left.
    pub fn request_more(&mut self) -> Option<Completion> {
        if !self.session.begin_load() {
            trace!(state = ?self.session.state(), "load skipped");
            return None;
        }
        self.page.set_loading(true);
        let url = self
            .endpoints
            .view(self.session.app(), self.session.cursor());
        debug!(%url, "requesting more records");
        Some(self.transport.send(Request::get(url)))
    }

    pub fn maybe_request_more(&mut self, probe: SentinelProbe) -> Option<Completion> {
        if sentinel_in_view(probe) {
            self.request_more()
        } else {
            None
        }
    }

    /// One tick of the scroll trigger.
    pub fn poll(&mut self) -> Option<Completion> {
        let probe = self.page.sentinel();
        self.maybe_request_more(probe)
    }

    /// Applies the outcome of the request returned by `request_more`.
    pub fn complete(&mut self, outcome: Outcome) {
        let response = match outcome {
            Ok(response) => response,
            Err(err) => return self.fail(err),
        };
        match ViewPage::parse(&response.body) {
            Ok(page) => self.receive(page),
            Err(e) => {
                warn!(error = %e, "malformed gallery response, no further loads");
                self.page.set_loading(false);
                self.session.complete_load(LoadOutcome::Failed);
            }
        }
    }

    fn receive(&mut self, page: ViewPage) {
        self.session.complete_load(LoadOutcome::Received {
            more: page.more,
            cursor: page.cursor,
        });
        self.page.set_loading(false);
        debug!(
            records = page.data.len(),
            more = self.session.has_more(),
            "received records"
        );
        for record in page.data {
            self.page.render(record);
            self.rendered += 1;
        }
    }

    // The loading indicator is left as is; only a parsed response hides it.
    fn fail(&mut self, err: TransportError) {
        warn!(error = %err, "load failed, no further loads");
        self.session.complete_load(LoadOutcome::Failed);
        if err.status() == Some(StatusCode::UNAUTHORIZED.as_u16()) {
            let login = self.endpoints.login();
            debug!(%login, "not signed in, redirecting");
            self.page.redirect(&login);
            self.redirected = true;
        }
    }
}
