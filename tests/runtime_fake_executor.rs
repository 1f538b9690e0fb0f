// tests/runtime_fake_executor.rs

use std::sync::{Arc, Mutex};
use std::time::Duration;

use assetpipe::engine::{
    CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions, TriggerReason,
    TriggerWhileRunningBehaviour,
};
use assetpipe_test_utils::fake_executor::FakeExecutor;
use assetpipe_test_utils::{init_tracing, with_timeout};
use tokio::sync::mpsc;

const TASKS: [&str; 4] = ["css", "js", "images", "html"];

fn core(behaviour: TriggerWhileRunningBehaviour, exit_when_idle: bool) -> CoreRuntime {
    CoreRuntime::new(
        TASKS.iter().map(|t| t.to_string()),
        behaviour,
        RuntimeOptions { exit_when_idle },
    )
}

fn trigger(task: &str) -> RuntimeEvent {
    RuntimeEvent::TaskTriggered {
        task: task.to_string(),
        reason: TriggerReason::FileWatch,
    }
}

async fn send_all(tx: &mpsc::Sender<RuntimeEvent>, events: Vec<RuntimeEvent>) {
    for event in events {
        tx.send(event).await.unwrap();
    }
}

#[tokio::test]
async fn triggers_while_running_collapse_into_one_rerun() {
    init_tracing();
    let (tx, rx) = mpsc::channel(16);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(tx.clone(), Arc::clone(&executed))
        .with_run_time(Duration::from_millis(100));

    send_all(&tx, vec![trigger("css"), trigger("css"), trigger("css"), trigger("css")]).await;

    let runtime = Runtime::new(core(TriggerWhileRunningBehaviour::Queue, true), rx, executor);
    with_timeout(runtime.run()).await.unwrap();

    assert_eq!(*executed.lock().unwrap(), vec!["css", "css"]);
}

#[tokio::test]
async fn ignore_drops_triggers_while_running() {
    init_tracing();
    let (tx, rx) = mpsc::channel(16);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(tx.clone(), Arc::clone(&executed))
        .with_run_time(Duration::from_millis(100));

    send_all(&tx, vec![trigger("js"), trigger("js"), trigger("js")]).await;

    let runtime = Runtime::new(core(TriggerWhileRunningBehaviour::Ignore, true), rx, executor);
    with_timeout(runtime.run()).await.unwrap();

    assert_eq!(*executed.lock().unwrap(), vec!["js"]);
}

#[tokio::test]
async fn different_tasks_run_concurrently() {
    init_tracing();
    let (tx, rx) = mpsc::channel(16);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(tx.clone(), Arc::clone(&executed))
        .with_run_time(Duration::from_millis(50));

    send_all(&tx, vec![trigger("css"), trigger("images"), trigger("html")]).await;

    let runtime = Runtime::new(core(TriggerWhileRunningBehaviour::Queue, true), rx, executor);
    with_timeout(runtime.run()).await.unwrap();

    // Each was dispatched exactly once, none queued behind another.
    assert_eq!(*executed.lock().unwrap(), vec!["css", "images", "html"]);
}

#[tokio::test]
async fn failed_task_keeps_the_loop_alive() {
    init_tracing();
    let (tx, rx) = mpsc::channel(16);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(tx.clone(), Arc::clone(&executed))
        .with_run_time(Duration::from_millis(20))
        .failing("css");

    send_all(&tx, vec![trigger("css")]).await;

    let runtime = Runtime::new(core(TriggerWhileRunningBehaviour::Queue, false), rx, executor);
    let handle = tokio::spawn(runtime.run());

    // Let the failing run finish, then fix the "source" and trigger again.
    tokio::time::sleep(Duration::from_millis(100)).await;
    send_all(&tx, vec![trigger("css"), RuntimeEvent::ShutdownRequested]).await;

    with_timeout(handle).await.unwrap().unwrap();
    assert_eq!(*executed.lock().unwrap(), vec!["css", "css"]);
}

#[tokio::test]
async fn unknown_task_trigger_is_ignored() {
    init_tracing();
    let (tx, rx) = mpsc::channel(16);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(tx.clone(), Arc::clone(&executed));

    send_all(&tx, vec![trigger("fonts"), RuntimeEvent::ShutdownRequested]).await;

    let runtime = Runtime::new(core(TriggerWhileRunningBehaviour::Queue, false), rx, executor);
    with_timeout(runtime.run()).await.unwrap();

    assert!(executed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn closing_the_channel_stops_the_runtime() {
    init_tracing();
    let (tx, rx) = mpsc::channel(16);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let (exec_tx, _exec_rx) = mpsc::channel(16);
    let executor = FakeExecutor::new(exec_tx, Arc::clone(&executed));
    drop(tx);

    let runtime = Runtime::new(core(TriggerWhileRunningBehaviour::Queue, false), rx, executor);
    with_timeout(runtime.run()).await.unwrap();
}
