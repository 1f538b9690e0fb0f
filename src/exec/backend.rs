// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of running transforms
//! itself, so tests can record dispatched tasks and answer with synthetic
//! `TaskCompleted` events.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::engine::{RuntimeEvent, ScheduledTask, TaskOutcome};
use crate::errors::Result;
use crate::pipeline::PipelineContext;
use crate::pipeline::runner::run_blocking;
use crate::server::ReloadHandle;

/// Trait abstracting how scheduled tasks are executed.
pub trait ExecutorBackend: Send {
    /// Dispatch the given tasks for execution.
    ///
    /// Implementations must eventually emit one `TaskCompleted` per task,
    /// otherwise the task stays marked as running.
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Production backend: runs pipeline tasks on the blocking pool.
#[derive(Debug)]
pub struct PipelineExecutor {
    ctx: Arc<PipelineContext>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    reload: Option<ReloadHandle>,
    reload_after_run: bool,
}

impl PipelineExecutor {
    /// Backend for plain watching: no browser notifications.
    pub fn new(ctx: Arc<PipelineContext>, runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self {
            ctx,
            runtime_tx,
            reload: None,
            reload_after_run: false,
        }
    }

    /// Backend for reload-enabled watching. Each successful run streams its
    /// outputs to `reload` and is then followed by a full page reload.
    pub fn with_reload(
        ctx: Arc<PipelineContext>,
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        reload: ReloadHandle,
    ) -> Self {
        Self {
            ctx,
            runtime_tx,
            reload: Some(reload),
            reload_after_run: true,
        }
    }
}

impl ExecutorBackend for PipelineExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            for task in tasks {
                let ctx = Arc::clone(&self.ctx);
                let runtime_tx = self.runtime_tx.clone();
                let reload = self.reload.clone();
                let reload_after_run = self.reload_after_run;

                tokio::spawn(async move {
                    debug!(task = %task.name, run_id = task.run_id, "starting task run");

                    let outcome = match run_blocking(ctx, task.name.clone()).await {
                        Ok(report) => {
                            if let Some(reload) = &reload {
                                reload.stream(&report);
                                if reload_after_run {
                                    reload.reload();
                                }
                            }
                            TaskOutcome::Success
                        }
                        Err(err) => TaskOutcome::Failed(format!("{err:#}")),
                    };

                    let event = RuntimeEvent::TaskCompleted {
                        task: task.name,
                        outcome,
                    };
                    if let Err(err) = runtime_tx.send(event).await {
                        warn!("failed to report task completion: {err}");
                    }
                });
            }
            Ok(())
        })
    }
}
