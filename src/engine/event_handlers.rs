// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::{debug, error, info, warn};

use crate::engine::core::{CoreRuntime, TaskRunState};
use crate::engine::{ScheduledTask, TaskName, TaskOutcome, TriggerReason};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// Request that the process exits (used when `exit_when_idle` is set).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn running(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Handle a task trigger event.
///
/// - An idle task is dispatched immediately.
/// - A running task consults the trigger queue; in queue mode one rerun is
///   remembered, in ignore mode the trigger is dropped.
/// - Other tasks are unaffected: each task only ever reruns itself.
pub fn handle_task_trigger(
    core: &mut CoreRuntime,
    task: TaskName,
    reason: TriggerReason,
) -> CoreStep {
    match core.states.get(&task).copied() {
        None => {
            warn!(task = %task, "trigger for unknown task; ignoring");
            CoreStep::running(Vec::new())
        }
        Some(TaskRunState::Idle) => {
            let scheduled = dispatch(core, task, reason);
            CoreStep::running(vec![CoreCommand::DispatchTasks(vec![scheduled])])
        }
        Some(TaskRunState::Running { run_id }) => {
            debug!(task = %task, run_id, "task triggered while running");
            core.queue.record_trigger(&task);
            CoreStep::running(Vec::new())
        }
    }
}

/// Handle a task completion event.
///
/// Failures are reported and the task goes back to idle so the next change
/// can retry it; the loop itself never stops because of a failed run.
pub fn handle_task_completion(
    core: &mut CoreRuntime,
    task: TaskName,
    outcome: TaskOutcome,
) -> CoreStep {
    let mut commands = Vec::new();

    let Some(state) = core.states.get(&task).copied() else {
        warn!(task = %task, "completion for unknown task; ignoring");
        return CoreStep::running(commands);
    };

    if state == TaskRunState::Idle {
        warn!(task = %task, "completion for a task that was not running");
    }

    match &outcome {
        TaskOutcome::Success => info!(task = %task, "task finished"),
        TaskOutcome::Failed(reason) => error!(task = %task, %reason, "task failed"),
    }

    core.states.insert(task.clone(), TaskRunState::Idle);

    if core.queue.take(&task) {
        let scheduled = dispatch(core, task, TriggerReason::Queued);
        commands.push(CoreCommand::DispatchTasks(vec![scheduled]));
    }

    let mut keep_running = true;
    if core.options.exit_when_idle && core.is_idle() && core.queue.is_empty() {
        keep_running = false;
        commands.push(CoreCommand::RequestExit);
    }

    CoreStep {
        commands,
        keep_running,
    }
}

fn dispatch(core: &mut CoreRuntime, task: TaskName, reason: TriggerReason) -> ScheduledTask {
    let run_id = core.allocate_run_id();
    core.states
        .insert(task.clone(), TaskRunState::Running { run_id });
    debug!(task = %task, run_id, ?reason, "dispatching task");
    ScheduledTask {
        name: task,
        run_id,
        reason,
    }
}
