pub mod admin;
pub mod controller;
pub mod record;

use reqwest::Url;

use crate::session::App;

pub use admin::{AdminToggle, ToggleEvent};
pub use controller::PaginationController;
pub use record::{Record, ViewPage};

pub const VIEW_PATH: &str = "/gallery-api/view";
pub const ADMIN_PATH: &str = "/gallery-api/admin";
pub const LOGIN_PATH: &str = "/admin";

/// Receives records in the order the server sent them. Append-only.
pub trait RecordRenderer {
    fn render(&mut self, record: Record);
}

/// The page surrounding the gallery: loading indicator, navigation and the
/// sentinel that sits below the last rendered record.
pub trait Page: RecordRenderer {
    fn set_loading(&mut self, visible: bool);

    fn redirect(&mut self, location: &Url);

    fn sentinel(&self) -> SentinelProbe;

    fn scroll_by(&mut self, _rows: usize) {}
}

/// Where the sentinel is relative to the visible area.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SentinelProbe {
    /// Top edge of the sentinel, measured from the top of the viewport.
    pub sentinel_top: f64,
    pub viewport_height: f64,
}

/// True once the sentinel has scrolled into (or above) the visible area.
pub fn sentinel_in_view(probe: SentinelProbe) -> bool {
    probe.sentinel_top <= probe.viewport_height
}

/// Server routes, resolved against one base URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn view(&self, app: App, cursor: Option<&str>) -> Url {
        let mut url = self.route(VIEW_PATH);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("app", app.as_str());
            if let Some(cursor) = cursor.filter(|c| !c.is_empty()) {
                query.append_pair("cursor", cursor);
            }
        }
        url
    }

    pub fn admin(&self) -> Url {
        self.route(ADMIN_PATH)
    }

    pub fn login(&self) -> Url {
        self.route(LOGIN_PATH)
    }

    fn route(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path(path);
        url.set_query(None);
        url.set_fragment(None);
        url
    }
}
