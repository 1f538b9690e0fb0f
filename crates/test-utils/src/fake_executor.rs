use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assetpipe::engine::{RuntimeEvent, ScheduledTask, TaskOutcome};
use assetpipe::errors::Result;
use assetpipe::exec::ExecutorBackend;
use tokio::sync::mpsc;

/// A fake executor that:
/// - records which tasks were "run", in dispatch order
/// - reports `TaskCompleted` for each scheduled task after `run_time`
/// - fails the tasks listed in `failing`.
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<String>>>,
    run_time: Duration,
    failing: HashSet<String>,
}

impl FakeExecutor {
    /// Tasks complete immediately and successfully.
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, executed: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            runtime_tx,
            executed,
            run_time: Duration::ZERO,
            failing: HashSet::new(),
        }
    }

    /// Keep every task "running" for `run_time` before it completes.
    pub fn with_run_time(mut self, run_time: Duration) -> Self {
        self.run_time = run_time;
        self
    }

    /// Report `TaskOutcome::Failed` for `task`.
    pub fn failing(mut self, task: &str) -> Self {
        self.failing.insert(task.to_string());
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);
        let run_time = self.run_time;
        let failing = self.failing.clone();

        Box::pin(async move {
            for t in tasks {
                {
                    let mut guard = executed.lock().unwrap();
                    guard.push(t.name.clone());
                }

                let outcome = if failing.contains(&t.name) {
                    TaskOutcome::Failed(format!("{} failed on purpose", t.name))
                } else {
                    TaskOutcome::Success
                };
                let tx = tx.clone();
                tokio::spawn(async move {
                    if !run_time.is_zero() {
                        tokio::time::sleep(run_time).await;
                    }
                    let _ = tx
                        .send(RuntimeEvent::TaskCompleted {
                            task: t.name,
                            outcome,
                        })
                        .await;
                });
            }
            Ok(())
        })
    }
}
