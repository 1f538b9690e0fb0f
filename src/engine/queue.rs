// src/engine/queue.rs

use std::collections::BTreeSet;

use tracing::debug;

use crate::engine::TaskName;
use crate::types::TriggerWhileRunningBehaviour;

/// Triggers that arrived while their task was already running.
///
/// Semantics:
/// - At most one extra run is remembered per task; repeated triggers during
///   one run coalesce.
/// - In `Ignore` mode nothing is ever remembered.
#[derive(Debug, Default)]
pub struct TriggerQueue {
    behaviour: TriggerWhileRunningBehaviour,
    pending: BTreeSet<TaskName>,
}

impl TriggerQueue {
    pub fn new(behaviour: TriggerWhileRunningBehaviour) -> Self {
        Self {
            behaviour,
            pending: BTreeSet::new(),
        }
    }

    /// Returns true if there are no queued triggers.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Record that `task` was triggered while running.
    ///
    /// Returns true if a rerun is now pending for it.
    pub fn record_trigger(&mut self, task: &str) -> bool {
        match self.behaviour {
            TriggerWhileRunningBehaviour::Queue => {
                let inserted = self.pending.insert(task.to_string());
                debug!(task = %task, inserted, "queued rerun (queue mode)");
                true
            }
            TriggerWhileRunningBehaviour::Ignore => {
                debug!(task = %task, "dropping trigger for running task (ignore mode)");
                false
            }
        }
    }

    /// Remove and return whether a rerun was pending for `task`.
    pub fn take(&mut self, task: &str) -> bool {
        self.pending.remove(task)
    }
}
