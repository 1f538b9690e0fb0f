// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::engine::RuntimeEvent;
use crate::fs::FileSystem;
use crate::watch::cache::FileCache;
use crate::watch::debounce::TaskDebouncer;
use crate::watch::event_handler::{WatchState, flush_ready, prime_hashes, record_event};
use crate::watch::hash::MemoryHashStore;
use crate::watch::patterns::{TaskWatchProfile, watch_roots};

/// Upper bound on how often the debouncer is polled.
const MAX_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Watcher tuning from the `[watch]` section.
#[derive(Debug, Clone, Copy)]
pub struct WatchOptions {
    /// Quiet period before a burst of changes triggers a task.
    pub delay: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(200),
        }
    }
}

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive. Dropping this handle
/// stops file watching and ends the background loop.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
    roots: Vec<PathBuf>,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("roots", &self.roots)
            .finish_non_exhaustive()
    }
}

impl WatcherHandle {
    /// Directories actually being watched.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

/// Spawn a filesystem watcher over the glob bases of `profiles` and send
/// `RuntimeEvent::TaskTriggered` for tasks whose glob matches a changed
/// path, once the change has settled.
///
/// - `root` is the project root against which all globs are evaluated.
/// - `runtime_tx` is the channel into the main runtime.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    profiles: Vec<TaskWatchProfile>,
    fs: Arc<dyn FileSystem>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    options: WatchOptions,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or(root);

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    // Not on a tracing-aware thread; stderr is all we have.
                    eprintln!("assetpipe: failed to forward notify event: {err}");
                }
            }
            Err(err) => eprintln!("assetpipe: file watch error: {err}"),
        },
        Config::default(),
    )?;

    let mut roots = Vec::new();
    for base in watch_roots(&profiles) {
        let dir = root.join(&base);
        if !fs.is_dir(&dir) {
            warn!(dir = ?dir, "watch directory does not exist; skipping");
            continue;
        }
        watcher.watch(&dir, RecursiveMode::Recursive)?;
        roots.push(dir);
    }

    info!(?roots, delay_ms = options.delay.as_millis() as u64, "file watcher started");

    let state = Arc::new(WatchState {
        fs,
        root,
        profiles,
        debouncer: TaskDebouncer::new(options.delay),
        file_cache: Mutex::new(FileCache::new()),
        hash_store: Mutex::new(Box::new(MemoryHashStore::new())),
    });

    tokio::spawn(async move {
        if state.profiles.iter().any(TaskWatchProfile::use_hash) {
            prime_hashes(Arc::clone(&state)).await;
        }

        let mut ticker = tokio::time::interval(options.delay.clamp(Duration::from_millis(1), MAX_POLL_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                maybe_event = event_rx.recv() => {
                    let Some(event) = maybe_event else { break };
                    debug!(?event, "received notify event");
                    record_event(&state, &event);
                }
                _ = ticker.tick() => {
                    if !flush_ready(&state, &runtime_tx).await {
                        break;
                    }
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle {
        _inner: watcher,
        roots,
    })
}
