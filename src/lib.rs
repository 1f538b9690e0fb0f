// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod server;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, Command};
use crate::config::model::ConfigFile;
use crate::config::{DEFAULT_CONFIG_FILE, load_or_default};
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions};
use crate::exec::PipelineExecutor;
use crate::fs::{FileSystem, RealFileSystem};
use crate::pipeline::PipelineContext;
use crate::pipeline::runner::run_sequence;
use crate::server::{LiveReloadServer, ReloadHandle, ServerConfig};
use crate::watch::{WatchOptions, build_profiles, spawn_watcher};

/// Capacity of the runtime event channel.
const RUNTIME_CHANNEL_CAPACITY: usize = 64;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the startup build sequence
/// - (serve only) the live-reload server
/// - file watcher, executor and runtime for the watch phase
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let explicit = args.config.is_some();
    let config_path = PathBuf::from(args.config.as_deref().unwrap_or(DEFAULT_CONFIG_FILE));
    let cfg = load_or_default(&config_path, explicit)?;
    let command = args.command.unwrap_or_default();

    if args.dry_run {
        print_dry_run(&cfg, command);
        return Ok(());
    }

    let root = config_root_dir(&config_path);
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let ctx = Arc::new(PipelineContext::from_config(&cfg, &root, Arc::clone(&fs))?);

    let reload = (command == Command::Serve)
        .then(|| ReloadHandle::new(&cfg.server.base_dir, cfg.server.inject_changes));

    run_sequence(Arc::clone(&ctx), &cfg.build.sequence, reload.as_ref()).await?;

    if command == Command::Build {
        return Ok(());
    }

    let server = match &reload {
        Some(reload) => Some(
            LiveReloadServer::start(ServerConfig::from_section(&cfg.server, &root), reload.clone())
                .await?,
        ),
        None => None,
    };

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(RUNTIME_CHANNEL_CAPACITY);

    let executor = match reload {
        Some(reload) => PipelineExecutor::with_reload(Arc::clone(&ctx), rt_tx.clone(), reload),
        None => PipelineExecutor::new(Arc::clone(&ctx), rt_tx.clone()),
    };

    let watcher_handle = spawn_watcher(
        &root,
        build_profiles(&ctx, cfg.watch.use_hash),
        fs,
        rt_tx.clone(),
        WatchOptions {
            delay: Duration::from_millis(cfg.watch.delay_ms),
        },
    )?;
    if watcher_handle.roots().is_empty() {
        warn!("no source directory exists yet; nothing will be rebuilt until restart");
    }

    // Ctrl-C → graceful shutdown.
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        info!("Ctrl-C received; shutting down");
        let _ = rt_tx.send(RuntimeEvent::ShutdownRequested).await;
    });

    let core = CoreRuntime::new(
        ctx.tasks().map(|t| t.name.clone()),
        cfg.watch.while_running,
        RuntimeOptions::default(),
    );
    let result = Runtime::new(core, rt_rx, executor).run().await;

    if let Some(server) = server {
        server.shutdown().await?;
    }

    Ok(result?)
}

/// Project root: the config file's directory, or the working directory for
/// a bare file name.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Simple dry-run output: print settings and the task table.
fn print_dry_run(cfg: &ConfigFile, command: Command) {
    println!("assetpipe dry-run ({command:?})");
    println!("  build.sequence = {:?}", cfg.build.sequence);
    println!(
        "  watch.delay_ms = {}, watch.while_running = {:?}, watch.use_hash = {}",
        cfg.watch.delay_ms, cfg.watch.while_running, cfg.watch.use_hash
    );
    println!(
        "  grid = {} columns, {}px max width, {}px gutter{}",
        cfg.grid.columns,
        cfg.grid.max_width,
        cfg.grid.gutter,
        if cfg.grid.legacy { ", legacy" } else { "" }
    );
    println!("  css.browsers = {:?}", cfg.css.browsers);
    if command == Command::Serve {
        println!(
            "  server = http://{}:{}/ (base_dir {}, notify {}, inject_changes {})",
            cfg.server.host,
            cfg.server.port,
            cfg.server.base_dir,
            cfg.server.notify,
            cfg.server.inject_changes
        );
    }
    println!();

    println!("tasks ({}):", cfg.tasks().len());
    for (name, task) in cfg.tasks() {
        println!("  - {name} ({})", task.kind);
        println!("      src: {}", task.src);
        println!("      dest: {}", task.dest);
        if let Some(bundle) = &task.bundle {
            println!("      bundle: {bundle}");
        }
    }

    debug!("dry-run complete (no execution)");
}
