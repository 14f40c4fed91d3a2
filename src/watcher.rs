//! Magic-folder watching.
//!
//! Manages one filesystem watcher per synchronized folder and turns raw
//! notify events into debounced [`FolderNotification`]s the history store
//! can ingest.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, UNIX_EPOCH};

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

use crate::history::types::RawEvent;

const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// One change notification for one path in one watched folder.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FolderNotification {
    pub folder_id: String,
    pub event: RawEvent,
}

impl FolderNotification {
    /// Builds the raw event for a path by stating it. A path that no
    /// longer exists (or a remove event) carries no size, which the store
    /// treats as the deletion marker.
    pub fn from_path(folder_id: &str, path: &Path, kind: &EventKind) -> Self {
        let mut event = RawEvent::new(path);
        let removed = matches!(kind, EventKind::Remove(_));
        if !removed {
            if let Ok(meta) = std::fs::metadata(path) {
                event.size = Some(meta.len());
                event.mtime = meta
                    .modified()
                    .ok()
                    .and_then(|m| m.duration_since(UNIX_EPOCH).ok())
                    .map(|d| d.as_secs_f64());
            }
        }
        event.action = Some(
            match kind {
                EventKind::Create(_) => "added",
                EventKind::Remove(_) => "removed",
                _ => "modified",
            }
            .to_string(),
        );
        Self {
            folder_id: folder_id.to_string(),
            event,
        }
    }
}

/// Compiles exclusion patterns ("*.tmp", ".DS_Store") into a matcher.
pub fn build_exclusions(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let trimmed = pattern.trim();
        if trimmed.is_empty() {
            continue;
        }
        builder.add(Glob::new(trimmed)?);
    }
    Ok(builder.build()?)
}

/// Collapses the event kinds seen for one path within a debounce window.
/// A file created in the window stays "added" through its follow-up
/// writes; anything else takes the latest kind.
fn merge_kinds(old: &EventKind, new: &EventKind) -> EventKind {
    match (old, new) {
        (EventKind::Create(_), EventKind::Modify(_)) => old.clone(),
        _ => new.clone(),
    }
}

fn merge_pending(pending: &mut HashMap<PathBuf, EventKind>, path: &Path, kind: &EventKind) {
    match pending.get(path) {
        Some(old) => {
            let merged = merge_kinds(old, kind);
            pending.insert(path.to_path_buf(), merged);
        }
        None => {
            pending.insert(path.to_path_buf(), kind.clone());
        }
    }
}

fn is_excluded(exclusions: &GlobSet, path: &Path) -> bool {
    if exclusions.is_match(path) {
        return true;
    }
    path.file_name()
        .map(|name| exclusions.is_match(Path::new(name)))
        .unwrap_or(false)
}

/// Watcher state for a single folder.
pub struct FolderWatcher {
    pub folder_id: String,
    pub folder_path: PathBuf,
    _watcher: RecommendedWatcher,
    cancellation_token: CancellationToken,
    _debounce_thread_handle: Option<thread::JoinHandle<()>>,
}

/// Manages the watchers of all configured folders.
pub struct WatcherManager {
    watchers: HashMap<String, FolderWatcher>,
}

impl Default for WatcherManager {
    fn default() -> Self {
        Self::new()
    }
}

impl WatcherManager {
    pub fn new() -> Self {
        Self {
            watchers: HashMap::new(),
        }
    }

    /// Starts watching a folder. Change notifications are debounced for
    /// 500ms and delivered one per changed path. Restarting an already
    /// watched folder id replaces the previous watcher.
    pub fn start_watching<F>(
        &mut self,
        folder_id: String,
        folder_path: PathBuf,
        exclude_patterns: &[String],
        on_change: F,
    ) -> Result<()>
    where
        F: Fn(FolderNotification) + Send + 'static,
    {
        if self.watchers.contains_key(&folder_id) {
            self.stop_watching(&folder_id)?;
        }

        let exclusions = build_exclusions(exclude_patterns)?;
        let cancellation_token = CancellationToken::new();
        let token_clone = cancellation_token.clone();

        // Bounded channel so a burst of notify events cannot exhaust
        // memory; when full the burst is dropped and the next flush
        // re-stats whatever survived.
        let (tx, rx) = std::sync::mpsc::sync_channel(100);

        let mut watcher =
            notify::recommended_watcher(move |res: std::result::Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    match event.kind {
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {
                            if tx.try_send(event).is_err() {
                                tracing::warn!("watch channel full, dropping event batch");
                            }
                        }
                        _ => {}
                    }
                }
            })?;

        watcher
            .watch(&folder_path, RecursiveMode::Recursive)
            .map_err(|source| crate::error::HistoryError::WatchFailed {
                path: folder_path.clone(),
                source,
            })?;
        tracing::info!(folder = %folder_id, path = %folder_path.display(), "watching folder");

        let thread_folder_id = folder_id.clone();
        let thread_handle = thread::spawn(move || {
            // One pending kind per path, merged across the window; the
            // store only needs the latest state of each file anyway.
            let mut pending: HashMap<PathBuf, EventKind> = HashMap::new();
            loop {
                if token_clone.is_cancelled() {
                    break;
                }

                let first = match rx.recv_timeout(DEBOUNCE_WINDOW) {
                    Ok(e) => e,
                    Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,
                    Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
                };
                for path in &first.paths {
                    merge_pending(&mut pending, path, &first.kind);
                }

                loop {
                    if token_clone.is_cancelled() {
                        return;
                    }

                    match rx.recv_timeout(DEBOUNCE_WINDOW) {
                        Ok(event) => {
                            for path in &event.paths {
                                merge_pending(&mut pending, path, &event.kind);
                            }
                        }
                        Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {
                            for (path, kind) in pending.drain() {
                                if is_excluded(&exclusions, &path) {
                                    continue;
                                }
                                // Directories are not history rows.
                                if path.is_dir() {
                                    continue;
                                }
                                on_change(FolderNotification::from_path(
                                    &thread_folder_id,
                                    &path,
                                    &kind,
                                ));
                            }
                            break;
                        }
                        Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => return,
                    }
                }
            }
        });

        self.watchers.insert(
            folder_id.clone(),
            FolderWatcher {
                folder_id,
                folder_path,
                _watcher: watcher,
                cancellation_token,
                _debounce_thread_handle: Some(thread_handle),
            },
        );

        Ok(())
    }

    pub fn stop_watching(&mut self, folder_id: &str) -> Result<()> {
        if let Some(mut watcher) = self.watchers.remove(folder_id) {
            watcher.cancellation_token.cancel();
            let _ = watcher._debounce_thread_handle.take();
            tracing::info!(folder = %folder_id, "stopped watching folder");
        }
        Ok(())
    }

    pub fn watched_folders(&self) -> Vec<String> {
        self.watchers.keys().cloned().collect()
    }

    pub fn is_watching(&self, folder_id: &str) -> bool {
        self.watchers.contains_key(folder_id)
    }

    pub fn stop_all(&mut self) {
        self.watchers.clear();
    }
}

impl Drop for FolderWatcher {
    fn drop(&mut self) {
        // Cancel only; joining here can deadlock. The thread exits on its
        // own once it sees the token.
        self.cancellation_token.cancel();
    }
}

impl Drop for WatcherManager {
    fn drop(&mut self) {
        self.stop_all();
    }
}

/// Backfill: reports every file already present in the folder as an
/// `added` event so a fresh history view starts populated.
pub fn scan_existing<F>(
    folder_id: &str,
    folder_path: &Path,
    exclude_patterns: &[String],
    on_change: F,
) -> Result<usize>
where
    F: Fn(FolderNotification),
{
    let exclusions = build_exclusions(exclude_patterns)?;
    let mut reported = 0;
    for entry in WalkDir::new(folder_path).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !entry.file_type().is_file() || is_excluded(&exclusions, path) {
            continue;
        }
        on_change(FolderNotification::from_path(
            folder_id,
            path,
            &EventKind::Create(notify::event::CreateKind::Any),
        ));
        reported += 1;
    }
    Ok(reported)
}
