pub mod app;
pub mod cli;
pub mod config;
pub mod gallery;
pub mod logging;
pub mod output;
pub mod session;
pub mod transport;
pub mod utils;
pub mod viewer;

pub use gallery::{AdminToggle, Page, PaginationController, Record, ToggleEvent};
pub use viewer::{Control, Options, ViewSummary, Viewer, ViewerError};

#[cfg(test)]
mod tests;
