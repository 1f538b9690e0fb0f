// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Mapping each task's source glob to a watch profile.
//! - Wiring up a cross-platform filesystem watcher (`notify`) over the glob
//!   base directories.
//! - Debouncing bursts of events per task.
//! - (Optionally) content hashing to avoid re-running tasks whose sources
//!   did not actually change.
//!
//! It only turns filesystem changes into task-level triggers; what happens
//! when a task is already running is decided by the engine.

pub mod cache;
pub mod debounce;
pub mod event_handler;
pub mod hash;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use debounce::TaskDebouncer;
pub use hash::{HashStore, MemoryHashStore, compute_aggregate_hash};
pub use patterns::{TaskWatchProfile, build_profiles, tasks_for_path, watch_roots};
pub use watcher::{WatchOptions, WatcherHandle, spawn_watcher};
