// src/pipeline/mod.rs

//! Asset transform tasks.
//!
//! Every task reads the files selected by its source glob, pushes them
//! through a fixed transform chain and writes the results below its
//! destination directory:
//!
//! - [`css`]: Sass → vendor prefixes + minification → `*.min.css`
//! - [`js`]: concatenation → bundle + minified bundle
//! - [`copy`]: byte-for-byte copy (images, html)
//!
//! [`runner`] executes the startup build sequence. Tasks only ever touch
//! their own destination, so different tasks can run concurrently.

pub mod copy;
pub mod css;
pub mod js;
pub mod runner;
pub mod sources;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use lightningcss::targets::Targets;
use tracing::{debug, info};

use crate::config::model::{ConfigFile, GridSection};
use crate::engine::TaskName;
use crate::errors::{AssetpipeError, Result};
use crate::fs::FileSystem;
use crate::types::TaskKind;

use self::sources::SourceGlob;

/// A fully resolved task: what to read, how to transform it, where to write.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub name: TaskName,
    pub kind: TaskKind,
    pub glob: SourceGlob,
    /// Destination directory, relative to the project root.
    pub dest: PathBuf,
    /// Bundle file name (only meaningful for `js` tasks).
    pub bundle: String,
}

/// Files written by one task run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskReport {
    pub task: TaskName,
    /// Written paths, relative to the project root, in write order.
    pub written: Vec<PathBuf>,
}

/// Everything a task needs to run, shared between the startup runner and
/// the watch-phase executor.
#[derive(Debug)]
pub struct PipelineContext {
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
    grid: GridSection,
    targets: Targets,
    tasks: BTreeMap<TaskName, TaskSpec>,
}

impl PipelineContext {
    /// Build the context from a validated config.
    ///
    /// `root` is the project root all globs and destinations are relative to.
    pub fn from_config(
        cfg: &ConfigFile,
        root: impl Into<PathBuf>,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self> {
        let mut tasks = BTreeMap::new();
        for (name, task) in cfg.tasks() {
            let spec = TaskSpec {
                name: name.clone(),
                kind: task.kind,
                glob: SourceGlob::new(&task.src)?,
                dest: PathBuf::from(&task.dest),
                bundle: task.effective_bundle().to_string(),
            };
            tasks.insert(name.clone(), spec);
        }

        Ok(Self {
            fs,
            root: root.into(),
            grid: cfg.grid.clone(),
            targets: css::browser_targets(&cfg.css.browsers)?,
            tasks,
        })
    }

    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn grid(&self) -> &GridSection {
        &self.grid
    }

    pub fn targets(&self) -> Targets {
        self.targets.clone()
    }

    pub fn task(&self, name: &str) -> Option<&TaskSpec> {
        self.tasks.get(name)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &TaskSpec> {
        self.tasks.values()
    }

    /// Write `contents` to `rel` (relative to the root) and return `rel`.
    fn write_output(&self, rel: PathBuf, contents: &[u8]) -> Result<PathBuf> {
        self.fs.write(&self.root.join(&rel), contents)?;
        debug!(path = ?rel, bytes = contents.len(), "wrote output");
        Ok(rel)
    }
}

/// Run a single task to completion.
///
/// Blocking: reads and writes files and does CPU-bound transforms. Async
/// callers should wrap this in `spawn_blocking`.
pub fn run_task(ctx: &PipelineContext, name: &str) -> Result<TaskReport> {
    let spec = ctx
        .task(name)
        .ok_or_else(|| AssetpipeError::TaskNotFound(name.to_string()))?;

    let started = Instant::now();
    info!(task = %name, kind = %spec.kind, src = %spec.glob.pattern(), "starting task");

    let written = match spec.kind {
        TaskKind::Css => css::run(ctx, spec)?,
        TaskKind::Js => js::run(ctx, spec)?,
        TaskKind::Copy => copy::run(ctx, spec)?,
    };

    info!(
        task = %name,
        files = written.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "finished task"
    );

    Ok(TaskReport {
        task: name.to_string(),
        written,
    })
}
