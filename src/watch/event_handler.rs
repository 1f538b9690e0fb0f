// src/watch/event_handler.rs

//! Turning notify events into debounced task triggers.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use notify::{Event, EventKind};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{RuntimeEvent, TriggerReason};
use crate::fs::FileSystem;
use crate::watch::cache::FileCache;
use crate::watch::debounce::TaskDebouncer;
use crate::watch::hash::{HashStore, compute_aggregate_hash};
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::{TaskWatchProfile, collect_matching_files, tasks_for_path};

/// Shared state behind the watcher loop.
#[derive(Debug)]
pub struct WatchState {
    pub fs: Arc<dyn FileSystem>,
    pub root: PathBuf,
    pub profiles: Vec<TaskWatchProfile>,
    pub debouncer: TaskDebouncer,
    pub file_cache: Mutex<FileCache>,
    pub hash_store: Mutex<Box<dyn HashStore>>,
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Feed one notify event into the debouncer.
///
/// Access-only events are dropped. Every path is mapped to the tasks whose
/// glob matches it; cached hashes for changed files are invalidated.
pub fn record_event(state: &WatchState, event: &Event) {
    if matches!(event.kind, EventKind::Access(_)) {
        return;
    }

    for path in &event.paths {
        record_path(state, path);
    }
}

fn record_path(state: &WatchState, path: &Path) {
    let Some(rel) = relative_str(&state.root, path) else {
        warn!("could not relativize path {:?} against root {:?}", path, state.root);
        return;
    };

    let tasks = tasks_for_path(&state.profiles, &rel);
    if tasks.is_empty() {
        return;
    }

    lock(&state.file_cache).invalidate(path);

    for task in tasks {
        debug!(task = %task, path = %rel, "watch match");
        state.debouncer.record(task);
    }
}

/// Send triggers for every task whose debounce window has elapsed.
///
/// Returns false once the runtime channel is closed.
pub async fn flush_ready(state: &Arc<WatchState>, runtime_tx: &mpsc::Sender<RuntimeEvent>) -> bool {
    for task in state.debouncer.drain_ready() {
        let Some(profile) = state.profiles.iter().find(|p| p.name() == task) else {
            continue;
        };

        if profile.use_hash() && !content_changed(Arc::clone(state), profile.clone()).await {
            continue;
        }

        debug!(task = %task, "triggering task");
        if let Err(err) = runtime_tx
            .send(RuntimeEvent::TaskTriggered {
                task,
                reason: TriggerReason::FileWatch,
            })
            .await
        {
            warn!("failed to send RuntimeEvent::TaskTriggered: {err}");
            return false;
        }
    }
    true
}

/// Record the current aggregate hash of every hashed task, so the first
/// change after startup is compared against the freshly built state.
pub async fn prime_hashes(state: Arc<WatchState>) {
    let result = tokio::task::spawn_blocking(move || {
        let active: Vec<&str> = state.profiles.iter().map(TaskWatchProfile::name).collect();
        lock(&state.hash_store).prune(&active);

        for profile in state.profiles.iter().filter(|p| p.use_hash()) {
            match aggregate_hash(&state, profile) {
                Ok(hash) => lock(&state.hash_store).save(profile.name(), &hash),
                Err(err) => warn!(task = %profile.name(), error = %err, "failed to prime task hash"),
            }
        }
    })
    .await;

    if let Err(err) = result {
        warn!("hash priming panicked: {err}");
    }
}

/// Returns true if the task's watched content differs from the last
/// recorded hash (and records the new one). Errors count as changed.
async fn content_changed(state: Arc<WatchState>, profile: TaskWatchProfile) -> bool {
    tokio::task::spawn_blocking(move || {
        let task = profile.name();
        let new_hash = match aggregate_hash(&state, &profile) {
            Ok(hash) => hash,
            Err(err) => {
                warn!(task = %task, error = %err, "failed to hash watched files; triggering anyway");
                return true;
            }
        };

        let mut store = lock(&state.hash_store);
        if store.load(task).as_deref() == Some(new_hash.as_str()) {
            info!(task = %task, "watched content unchanged; skipping trigger");
            return false;
        }
        store.save(task, &new_hash);
        true
    })
    .await
    .unwrap_or(true)
}

fn aggregate_hash(state: &WatchState, profile: &TaskWatchProfile) -> anyhow::Result<String> {
    let files = collect_matching_files(state.fs.as_ref(), &state.root, profile)?;
    let mut cache = lock(&state.file_cache);
    let mut hashes = Vec::with_capacity(files.len());
    for (rel, path) in files {
        let hash = cache.get_or_compute(state.fs.as_ref(), &path)?;
        hashes.push((rel, hash));
    }
    Ok(compute_aggregate_hash(&hashes))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use notify::event::{AccessKind, CreateKind, ModifyKind};

    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::pipeline::sources::SourceGlob;
    use crate::watch::hash::MemoryHashStore;

    fn state(fs: MockFileSystem, use_hash: bool) -> Arc<WatchState> {
        let profiles = vec![
            TaskWatchProfile::new("css", SourceGlob::new("src/css/*.scss").unwrap(), use_hash),
            TaskWatchProfile::new("js", SourceGlob::new("src/js/*.js").unwrap(), use_hash),
        ];
        Arc::new(WatchState {
            fs: Arc::new(fs),
            root: PathBuf::from("."),
            profiles,
            debouncer: TaskDebouncer::new(Duration::ZERO),
            file_cache: Mutex::new(FileCache::new()),
            hash_store: Mutex::new(Box::new(MemoryHashStore::new())),
        })
    }

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    async fn drain(state: &Arc<WatchState>) -> Vec<String> {
        let (tx, mut rx) = mpsc::channel(16);
        assert!(flush_ready(state, &tx).await);
        drop(tx);
        let mut tasks = Vec::new();
        while let Some(RuntimeEvent::TaskTriggered { task, .. }) = rx.recv().await {
            tasks.push(task);
        }
        tasks
    }

    #[tokio::test]
    async fn only_the_owning_task_is_triggered() {
        let state = state(MockFileSystem::new(), false);
        record_event(&state, &event(EventKind::Modify(ModifyKind::Any), "./src/js/app.js"));
        assert_eq!(drain(&state).await, vec!["js".to_string()]);
    }

    #[tokio::test]
    async fn access_events_are_ignored() {
        let state = state(MockFileSystem::new(), false);
        record_event(&state, &event(EventKind::Access(AccessKind::Any), "./src/css/main.scss"));
        assert!(drain(&state).await.is_empty());
    }

    #[tokio::test]
    async fn unchanged_content_is_skipped_with_hashing() {
        let fs = MockFileSystem::new();
        fs.add_file("./src/css/main.scss", "a { b: c }");
        let state = state(fs.clone(), true);
        prime_hashes(Arc::clone(&state)).await;

        // Touch without changing contents.
        record_event(&state, &event(EventKind::Create(CreateKind::File), "./src/css/main.scss"));
        assert!(drain(&state).await.is_empty());

        fs.add_file("./src/css/main.scss", "a { b: d }");
        record_event(&state, &event(EventKind::Modify(ModifyKind::Any), "./src/css/main.scss"));
        assert_eq!(drain(&state).await, vec!["css".to_string()]);
    }
}
