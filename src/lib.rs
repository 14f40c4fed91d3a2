pub mod config;
pub mod error;
pub mod formatting;
pub mod history;
pub mod path_validation;
pub mod service;
pub mod system_integration;
pub mod watcher;


pub use config::Config;
pub use error::HistoryError;
pub use history::{EventAction, HistoryStore, RawEvent, SyncEvent, DEFAULT_MAX_ITEMS};
pub use service::{EntryAction, HistoryService};
pub use system_integration::{Desktop, DesktopIntegration};
pub use watcher::{FolderNotification, WatcherManager};
