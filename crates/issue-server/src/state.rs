use issue_core::BoardFile;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::{broadcast, Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;

const WATCH_INTERVAL: Duration = Duration::from_millis(800);

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub board: BoardFile,
    /// Built web UI, served for every path the API does not claim.
    pub web_dist: Option<PathBuf>,
    pub event_tx: broadcast::Sender<()>,
    write_lock: Arc<Mutex<()>>,
    /// Stops the mtime poller when the last clone of the state goes away.
    _watcher: Option<Arc<Watcher>>,
}

struct Watcher(JoinHandle<()>);

impl Drop for Watcher {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl AppState {
    pub fn new(board: BoardFile, web_dist: Option<PathBuf>) -> Self {
        let (tx, _) = broadcast::channel(64);

        // Poll the board file's mtime so edits from the CLI or a text editor
        // reach connected browsers too. Skipped outside a runtime.
        let watcher = tokio::runtime::Handle::try_current().ok().map(|rt| {
            let path = board.path().to_path_buf();
            let tx = tx.clone();
            let handle = rt.spawn(async move {
                let mut last_mtime = None::<SystemTime>;
                loop {
                    tokio::time::sleep(WATCH_INTERVAL).await;
                    let Ok(meta) = tokio::fs::metadata(&path).await else {
                        continue;
                    };
                    if let Ok(mtime) = meta.modified() {
                        if last_mtime.is_some_and(|t| t != mtime) {
                            let _ = tx.send(());
                        }
                        last_mtime = Some(mtime);
                    }
                }
            });
            Arc::new(Watcher(handle))
        });

        Self {
            board,
            web_dist,
            event_tx: tx,
            write_lock: Arc::new(Mutex::new(())),
            _watcher: watcher,
        }
    }

    /// Serialise read-modify-write cycles within this process. The guard is
    /// owned so it can move into `spawn_blocking`.
    pub async fn lock(&self) -> OwnedMutexGuard<()> {
        Arc::clone(&self.write_lock).lock_owned().await
    }
}
