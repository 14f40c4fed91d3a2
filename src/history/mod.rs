pub mod store;
pub mod types;

pub use store::{HistoryStore, DEFAULT_MAX_ITEMS};
pub use types::{EventAction, RawEvent, SyncEvent};
