use tracing::info;
use url::form_urlencoded;

use super::Endpoints;
use crate::transport::{Request, Transport};

/// Element id prefix of the publish checkbox rendered next to each record.
pub const CHECKBOX_PREFIX: &str = "publish_";

/// A moderation decision for one record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToggleEvent {
    pub key: String,
    pub public: bool,
}

impl ToggleEvent {
    pub fn new(key: impl Into<String>, public: bool) -> Self {
        Self {
            key: key.into(),
            public,
        }
    }

    pub fn from_checkbox(id: &str, checked: bool) -> Option<Self> {
        id.strip_prefix(CHECKBOX_PREFIX)
            .filter(|key| !key.is_empty())
            .map(|key| Self::new(key, checked))
    }

    /// `key=<key>&public=<0|1>`
    pub fn form_body(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("key", &self.key)
            .append_pair("public", if self.public { "1" } else { "0" })
            .finish()
    }
}

/// Publishes or unpublishes records. Requests are detached: nothing local
/// changes and failures are never reported.
pub struct AdminToggle<T> {
    endpoints: Endpoints,
    transport: T,
}

impl<T: Transport> AdminToggle<T> {
    pub fn new(endpoints: Endpoints, transport: T) -> Self {
        Self {
            endpoints,
            transport,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn set_published(&self, key: &str, public: bool) {
        self.send(&ToggleEvent::new(key, public));
    }

    pub fn send(&self, event: &ToggleEvent) {
        info!(key = %event.key, public = event.public, "sending publish toggle");
        self.transport
            .send_detached(Request::post_form(self.endpoints.admin(), event.form_body()));
    }
}
