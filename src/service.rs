//! Gateway history service.
//!
//! One instance per gateway connection. It owns that gateway's
//! [`HistoryStore`] behind a single mutex (ingest is a read-modify-write
//! over the whole entry set, so the lock covers every operation) and
//! exposes the two contracts the display layer drives: activating an
//! entry and running a named context action on it.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use tokio::sync::mpsc;

use crate::error::HistoryError;
use crate::history::store::HistoryStore;
use crate::history::types::SyncEvent;
use crate::system_integration::DesktopIntegration;
use crate::watcher::FolderNotification;

/// Named context actions on a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryAction {
    OpenFile,
    OpenEnclosingFolder,
}

#[derive(Clone)]
pub struct HistoryService {
    store: Arc<Mutex<HistoryStore>>,
    desktop: Arc<dyn DesktopIntegration>,
}

impl HistoryService {
    pub fn new(store: HistoryStore, desktop: Arc<dyn DesktopIntegration>) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            desktop,
        }
    }

    /// Feeds one watcher notification into the store. Total: malformed
    /// records are defaulted by the store, never rejected.
    pub fn ingest(&self, notification: FolderNotification) {
        tracing::debug!(
            folder = %notification.folder_id,
            path = %notification.event.path.display(),
            "ingesting event"
        );
        let mut store = self.store.lock().unwrap();
        store.ingest(notification.event);
    }

    /// Current entries, newest first.
    pub fn snapshot(&self) -> Vec<SyncEvent> {
        self.store.lock().unwrap().snapshot()
    }

    pub fn count(&self) -> usize {
        self.store.lock().unwrap().count()
    }

    pub fn lookup(&self, index: usize) -> Result<SyncEvent, HistoryError> {
        let store = self.store.lock().unwrap();
        store.lookup_by_position(index).cloned()
    }

    /// Double-activation of an entry: reveal it in the file manager and
    /// return its path to the caller.
    pub fn activate(&self, index: usize) -> Result<PathBuf> {
        let event = self.lookup(index)?;
        self.desktop.open_enclosing_folder(&event.path)?;
        Ok(event.path)
    }

    /// Context-menu action on an entry, executed by path.
    pub fn run_action(&self, index: usize, action: EntryAction) -> Result<()> {
        let event = self.lookup(index)?;
        match action {
            EntryAction::OpenFile => self.desktop.open_path(&event.path),
            EntryAction::OpenEnclosingFolder => self.desktop.open_enclosing_folder(&event.path),
        }
    }

    /// Consumes watcher notifications from a channel until the senders
    /// hang up. The alternative to calling [`ingest`](Self::ingest)
    /// directly when the watcher runs off-thread.
    pub async fn run_ingest_loop(&self, mut rx: mpsc::Receiver<FolderNotification>) {
        while let Some(notification) = rx.recv().await {
            self.ingest(notification);
        }
        tracing::info!("ingest channel closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::types::RawEvent;
    use std::path::Path;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingDesktop {
        opened: StdMutex<Vec<PathBuf>>,
        revealed: StdMutex<Vec<PathBuf>>,
    }

    impl DesktopIntegration for RecordingDesktop {
        fn open_path(&self, path: &Path) -> Result<()> {
            self.opened.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }

        fn open_enclosing_folder(&self, path: &Path) -> Result<()> {
            self.revealed.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    fn notification(path: &str, timestamp: i64) -> FolderNotification {
        let mut event = RawEvent::new(path);
        event.size = Some(64);
        event.mtime = Some(timestamp as f64);
        FolderNotification {
            folder_id: "docs".to_string(),
            event,
        }
    }

    fn service() -> (HistoryService, Arc<RecordingDesktop>) {
        let desktop = Arc::new(RecordingDesktop::default());
        let service = HistoryService::new(HistoryStore::new(true, 10), desktop.clone());
        (service, desktop)
    }

    #[test]
    fn test_ingest_and_snapshot() {
        let (service, _) = service();
        service.ingest(notification("/magic/a.txt", 1));
        service.ingest(notification("/magic/b.txt", 2));

        let snapshot = service.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].path.to_str(), Some("/magic/b.txt"));
    }

    #[test]
    fn test_activate_reveals_and_returns_path() {
        let (service, desktop) = service();
        service.ingest(notification("/magic/a.txt", 1));

        let path = service.activate(0).unwrap();
        assert_eq!(path.to_str(), Some("/magic/a.txt"));
        assert_eq!(desktop.revealed.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_context_actions_execute_by_path() {
        let (service, desktop) = service();
        service.ingest(notification("/magic/a.txt", 1));

        service.run_action(0, EntryAction::OpenFile).unwrap();
        service
            .run_action(0, EntryAction::OpenEnclosingFolder)
            .unwrap();

        assert_eq!(
            desktop.opened.lock().unwrap().as_slice(),
            &[PathBuf::from("/magic/a.txt")]
        );
        assert_eq!(
            desktop.revealed.lock().unwrap().as_slice(),
            &[PathBuf::from("/magic/a.txt")]
        );
    }

    #[test]
    fn test_activate_out_of_range_is_recoverable() {
        let (service, desktop) = service();
        assert!(service.activate(0).is_err());
        assert!(desktop.revealed.lock().unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_ingest_keeps_capacity_bound() {
        let desktop = Arc::new(RecordingDesktop::default());
        let service = HistoryService::new(HistoryStore::new(false, 8), desktop);

        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let service = service.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        service
                            .ingest(notification(&format!("/magic/{worker}-{i}"), i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(service.count(), 8);
        let snapshot = service.snapshot();
        for pair in snapshot.windows(2) {
            assert!(pair[0].timestamp >= pair[1].timestamp);
        }
    }

    #[tokio::test]
    async fn test_run_ingest_loop_drains_channel() {
        let (service, _) = service();
        let (tx, rx) = mpsc::channel(16);

        let consumer = {
            let service = service.clone();
            tokio::spawn(async move { service.run_ingest_loop(rx).await })
        };

        for i in 0..5 {
            tx.send(notification(&format!("/magic/f{i}"), i)).await.unwrap();
        }
        drop(tx);
        consumer.await.unwrap();

        assert_eq!(service.count(), 5);
    }
}
