pub mod app;
pub mod archive;
pub mod cli;
pub mod config;
pub mod date;
pub mod debounce;
pub mod dom;
pub mod history;
pub mod ui;
pub mod url_state;

pub use archive::{ArchiveController, ArchiveView, FilterState, Mounted, SkipReason};
pub use config::{ArchiveConfig, ConfigLoader, ConfigPaths};
pub use dom::Document;
