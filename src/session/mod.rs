use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Value of the `app` parameter that switches the gallery into moderation mode.
pub const ADMIN_APP: &str = "admin";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum App {
    Turtle,
    Movie,
    Music,
    Admin,
}

impl App {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Turtle => "turtle",
            Self::Movie => "movie",
            Self::Music => "music",
            Self::Admin => ADMIN_APP,
        }
    }

    /// Heading shown in front of the gallery; empty for the admin view.
    pub fn label(self) -> &'static str {
        match self {
            Self::Turtle => "Turtle",
            Self::Movie => "Movie",
            Self::Music => "Music",
            Self::Admin => "",
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for App {
    type Err = SessionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "turtle" => Ok(Self::Turtle),
            "movie" => Ok(Self::Movie),
            "music" => Ok(Self::Music),
            ADMIN_APP => Ok(Self::Admin),
            other => Err(SessionError::UnknownApp {
                app: other.to_string(),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayMode {
    Public,
    Admin,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("unknown app: {app:?} (expected turtle, movie, music or admin)")]
    UnknownApp { app: String },
}

/// Effective state of the two loading flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadState {
    IdleMore,
    Loading,
    Exhausted,
}

/// How an in-flight load ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Received { more: bool, cursor: Option<String> },
    Failed,
}

/// Pagination state for one gallery view.
///
/// `load_requested` is the single-flight guard: it is raised by
/// [`GallerySession::begin_load`] and lowered only by
/// [`GallerySession::complete_load`]. `has_more` only ever goes from true to
/// false.
#[derive(Clone, Debug)]
pub struct GallerySession {
    app: App,
    cursor: String,
    has_more: bool,
    load_requested: bool,
}

impl GallerySession {
    pub fn new(app: App) -> Self {
        Self {
            app,
            cursor: String::new(),
            has_more: true,
            load_requested: false,
        }
    }

    /// Resolves the `app` parameter; anything outside the known set is fatal.
    pub fn init(app: &str) -> Result<Self, SessionError> {
        Ok(Self::new(app.parse()?))
    }

    pub fn app(&self) -> App {
        self.app
    }

    pub fn display_mode(&self) -> DisplayMode {
        if self.app.is_admin() {
            DisplayMode::Admin
        } else {
            DisplayMode::Public
        }
    }

    /// The cursor to echo back, or `None` while it is empty.
    pub fn cursor(&self) -> Option<&str> {
        if self.cursor.is_empty() {
            None
        } else {
            Some(&self.cursor)
        }
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.load_requested
    }

    pub fn state(&self) -> LoadState {
        if self.load_requested {
            LoadState::Loading
        } else if self.has_more {
            LoadState::IdleMore
        } else {
            LoadState::Exhausted
        }
    }

    /// Raises the in-flight flag. Returns false, changing nothing, when a load
    /// is already in flight or the feed is exhausted.
    pub fn begin_load(&mut self) -> bool {
        if self.load_requested || !self.has_more {
            return false;
        }
        self.load_requested = true;
        true
    }

    pub fn complete_load(&mut self, outcome: LoadOutcome) {
        self.load_requested = false;
        match outcome {
            LoadOutcome::Received { more, cursor } => {
                self.has_more = self.has_more && more;
                self.cursor = cursor.unwrap_or_default();
            }
            LoadOutcome::Failed => {
                self.has_more = false;
            }
        }
    }
}
