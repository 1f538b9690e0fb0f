// src/pipeline/runner.rs

//! Startup build sequence: run the configured tasks one after another,
//! each starting only after the previous one finished.

use std::sync::Arc;

use anyhow::anyhow;
use tracing::{error, info};

use crate::engine::TaskName;
use crate::errors::Result;
use crate::server::ReloadHandle;

use super::{PipelineContext, TaskReport, run_task};

/// Run `sequence` in order. The first failing task aborts the sequence and
/// its error is returned.
///
/// When `reload` is given, each finished task streams its outputs to it.
pub async fn run_sequence(
    ctx: Arc<PipelineContext>,
    sequence: &[TaskName],
    reload: Option<&ReloadHandle>,
) -> Result<Vec<TaskReport>> {
    info!(?sequence, "running build sequence");

    let mut reports = Vec::with_capacity(sequence.len());
    for name in sequence {
        let report = run_blocking(Arc::clone(&ctx), name.clone())
            .await
            .inspect_err(|err| {
                error!(task = %name, error = %err, "task failed; aborting build sequence");
            })?;

        if let Some(reload) = reload {
            reload.stream(&report);
        }
        reports.push(report);
    }

    info!(tasks = reports.len(), "build sequence complete");
    Ok(reports)
}

/// Run one task on the blocking pool.
pub async fn run_blocking(ctx: Arc<PipelineContext>, name: TaskName) -> Result<TaskReport> {
    tokio::task::spawn_blocking(move || run_task(&ctx, &name))
        .await
        .map_err(|join_err| anyhow!("task panicked: {join_err}"))?
}
