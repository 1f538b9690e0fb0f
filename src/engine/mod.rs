// src/engine/mod.rs

//! Watch-phase orchestration.
//!
//! This module ties together:
//! - per-task run state (at most one instance of a task runs at a time)
//! - the trigger queue (what happens when a task is triggered while running)
//! - the main runtime event loop that reacts to:
//!   - file-watch triggers
//!   - task completion events
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

/// Canonical task name type used throughout the crate.
pub type TaskName = String;

/// Outcome of a task run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed(String),
}

/// Why a task was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Triggered due to a filesystem event.
    FileWatch,
    /// Rerun of a trigger that arrived while the task was running.
    Queued,
}

/// A task instance handed to the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    pub name: TaskName,
    /// Monotonic id, unique per dispatched instance.
    pub run_id: u64,
    pub reason: TriggerReason,
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// If true, exit the runtime once every task is idle and nothing is
    /// queued.
    pub exit_when_idle: bool,
}

/// Events flowing into the runtime from the watcher, executor, etc.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A task should be (re)run.
    TaskTriggered {
        task: TaskName,
        reason: TriggerReason,
    },
    /// A task run finished.
    TaskCompleted {
        task: TaskName,
        outcome: TaskOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod queue;
pub mod runtime;

pub use crate::types::TriggerWhileRunningBehaviour;
pub use core::{CoreRuntime, TaskRunState};
pub use event_handlers::{CoreCommand, CoreStep};
pub use queue::TriggerQueue;
pub use runtime::Runtime;
