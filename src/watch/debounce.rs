// src/watch/debounce.rs

//! Per-task debouncing.
//!
//! Editors often emit several events per save (truncate, write, chmod,
//! rename). Each matched event pushes the task's deadline forward; the task
//! is released once no event arrived for the whole delay.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::engine::TaskName;

/// Thread-safe debouncer keyed by task name.
#[derive(Debug)]
pub struct TaskDebouncer {
    pending: Mutex<HashMap<TaskName, Instant>>,
    delay: Duration,
}

impl TaskDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            delay,
        }
    }

    /// Record a change for `task` observed at `now`.
    pub fn record_at(&self, task: &str, now: Instant) {
        self.lock().insert(task.to_string(), now + self.delay);
    }

    /// Record a change for `task` observed now.
    pub fn record(&self, task: &str) {
        self.record_at(task, Instant::now());
    }

    /// Remove and return the tasks whose deadline passed at `now`, sorted by
    /// name.
    pub fn drain_ready_at(&self, now: Instant) -> Vec<TaskName> {
        let mut pending = self.lock();
        let mut ready: Vec<TaskName> = pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(task, _)| task.clone())
            .collect();
        for task in &ready {
            pending.remove(task);
        }
        ready.sort();
        ready
    }

    /// Remove and return the tasks whose deadline passed.
    pub fn drain_ready(&self) -> Vec<TaskName> {
        self.drain_ready_at(Instant::now())
    }

    pub fn has_pending(&self) -> bool {
        !self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TaskName, Instant>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
