// src/watch/patterns.rs

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::engine::TaskName;
use crate::fs::FileSystem;
use crate::pipeline::PipelineContext;
use crate::pipeline::sources::SourceGlob;
use crate::watch::path_utils::outermost_dirs;

/// What the watcher knows about one task: its name, the glob whose matches
/// re-trigger it, and whether triggers are filtered by content hash.
#[derive(Debug, Clone)]
pub struct TaskWatchProfile {
    name: TaskName,
    glob: SourceGlob,
    use_hash: bool,
}

impl TaskWatchProfile {
    pub fn new(name: impl Into<TaskName>, glob: SourceGlob, use_hash: bool) -> Self {
        Self {
            name: name.into(),
            glob,
            use_hash,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn glob(&self) -> &SourceGlob {
        &self.glob
    }

    pub fn use_hash(&self) -> bool {
        self.use_hash
    }

    /// Returns true if a change to `rel_path` (relative to the project
    /// root) should re-run this task.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.glob.is_match(rel_path)
    }
}

/// One profile per configured task, in task-name order.
pub fn build_profiles(ctx: &PipelineContext, use_hash: bool) -> Vec<TaskWatchProfile> {
    ctx.tasks()
        .map(|spec| TaskWatchProfile::new(spec.name.clone(), spec.glob.clone(), use_hash))
        .collect()
}

/// Directories to watch recursively: the glob bases of all profiles, with
/// nested bases folded into their ancestor.
pub fn watch_roots(profiles: &[TaskWatchProfile]) -> Vec<PathBuf> {
    outermost_dirs(
        profiles
            .iter()
            .map(|p| p.glob().base().to_path_buf())
            .collect(),
    )
}

/// Names of the tasks whose glob matches `rel_path`.
pub fn tasks_for_path<'a>(profiles: &'a [TaskWatchProfile], rel_path: &str) -> Vec<&'a str> {
    profiles
        .iter()
        .filter(|p| p.matches(rel_path))
        .map(TaskWatchProfile::name)
        .collect()
}

/// All files under `root` currently selected by this profile's glob, as
/// `(relative path, filesystem path)` pairs sorted by relative path.
pub fn collect_matching_files(
    fs: &dyn FileSystem,
    root: &Path,
    profile: &TaskWatchProfile,
) -> Result<Vec<(String, PathBuf)>> {
    let files = profile.glob().resolve(fs, root)?;
    Ok(files.into_iter().map(|f| (f.rel, f.path)).collect())
}
