// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - sending `ScheduledTask`s to the executor
//! - handling Ctrl+C / shutdown
//!
//! The core is unit tested without any Tokio, channels, filesystem, or
//! transforms.

use std::collections::BTreeMap;

use crate::engine::event_handlers::{CoreStep, handle_task_completion, handle_task_trigger};
use crate::engine::queue::TriggerQueue;
use crate::engine::{RuntimeEvent, RuntimeOptions, TaskName};
use crate::types::TriggerWhileRunningBehaviour;

/// Run state of a single task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRunState {
    Idle,
    Running { run_id: u64 },
}

/// Pure core runtime state.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    pub(crate) states: BTreeMap<TaskName, TaskRunState>,
    pub(crate) queue: TriggerQueue,
    pub(crate) options: RuntimeOptions,
    pub(crate) next_run_id: u64,
}

impl CoreRuntime {
    pub fn new<I, S>(tasks: I, behaviour: TriggerWhileRunningBehaviour, options: RuntimeOptions) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        let states = tasks
            .into_iter()
            .map(|name| (name.into(), TaskRunState::Idle))
            .collect();
        Self {
            states,
            queue: TriggerQueue::new(behaviour),
            options,
            next_run_id: 1,
        }
    }

    /// True when no task is running.
    pub fn is_idle(&self) -> bool {
        self.states.values().all(|s| *s == TaskRunState::Idle)
    }

    /// Expose queue emptiness (for tests).
    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn state_of(&self, task: &str) -> Option<TaskRunState> {
        self.states.get(task).copied()
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskTriggered { task, reason } => handle_task_trigger(self, task, reason),
            RuntimeEvent::TaskCompleted { task, outcome } => {
                handle_task_completion(self, task, outcome)
            }
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }

    pub(crate) fn allocate_run_id(&mut self) -> u64 {
        let id = self.next_run_id;
        self.next_run_id += 1;
        id
    }
}
