use std::path::PathBuf;

/// Library-surface errors. Glue code and the CLI wrap these in
/// `anyhow::Result` at the boundary.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// Lookup rank outside `[0, count)`. Recoverable; the view simply has
    /// no row there.
    #[error("no history entry at position {index} (store holds {count})")]
    NotFound { index: usize, count: usize },

    #[error("failed to watch {path:?}: {source}")]
    WatchFailed {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("failed to open {path:?}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },
}
