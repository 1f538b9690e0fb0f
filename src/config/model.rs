// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::{TaskKind, TriggerWhileRunningBehaviour};

/// Top-level configuration as read from `Assetpipe.toml`.
///
/// ```toml
/// [grid]
/// columns = 12
///
/// [server]
/// port = 3000
///
/// [task.css]
/// kind = "css"
/// src = "src/css/*.scss"
/// dest = "dist/assets/css"
/// ```
///
/// All sections are optional. When no `[task.<name>]` table is present the
/// four default tasks (css, js, images, html) are used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub grid: GridSection,

    #[serde(default)]
    pub css: CssSection,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub build: BuildSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `validate.rs`), so
/// holders can rely on the invariants checked there.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub grid: GridSection,
    pub css: CssSection,
    pub server: ServerSection,
    pub watch: WatchSection,
    pub build: BuildSection,
    task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            grid: raw.grid,
            css: raw.css,
            server: raw.server,
            watch: raw.watch,
            build: raw.build,
            task: raw.task,
        }
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.task
    }

    pub fn task(&self, name: &str) -> Option<&TaskConfig> {
        self.task.get(name)
    }
}

/// `[grid]` section: layout parameters handed to every stylesheet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GridSection {
    /// Number of columns in the grid.
    #[serde(default = "default_columns")]
    pub columns: u32,

    /// Maximum grid width in px.
    #[serde(default = "default_max_width")]
    pub max_width: u32,

    /// Gutter width in px.
    #[serde(default = "default_gutter")]
    pub gutter: u32,

    /// Work around the double-margin bug of old browsers.
    #[serde(default)]
    pub legacy: bool,
}

fn default_columns() -> u32 {
    12
}

fn default_max_width() -> u32 {
    960
}

fn default_gutter() -> u32 {
    20
}

impl Default for GridSection {
    fn default() -> Self {
        Self {
            columns: default_columns(),
            max_width: default_max_width(),
            gutter: default_gutter(),
            legacy: false,
        }
    }
}

/// `[css]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CssSection {
    /// Browserslist queries deciding which vendor prefixes are emitted.
    #[serde(default = "default_browsers")]
    pub browsers: Vec<String>,
}

fn default_browsers() -> Vec<String> {
    vec!["defaults".to_string()]
}

impl Default for CssSection {
    fn default() -> Self {
        Self {
            browsers: default_browsers(),
        }
    }
}

/// `[server]` section for the live-reload server (`serve` command).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Document root, relative to the project root.
    #[serde(default = "default_base_dir")]
    pub base_dir: String,

    /// Show an in-page toast whenever the browser is reloaded or styles are
    /// injected.
    #[serde(default)]
    pub notify: bool,

    /// Inject changed stylesheets instead of reloading the whole page.
    #[serde(default = "default_true")]
    pub inject_changes: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_base_dir() -> String {
    "dist".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_dir: default_base_dir(),
            notify: false,
            inject_changes: true,
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WatchSection {
    /// Quiet period after the last change before a task is triggered.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// What to do with triggers that arrive while the task is running.
    #[serde(default)]
    pub while_running: TriggerWhileRunningBehaviour,

    /// Skip triggers when the content of the task's sources is unchanged.
    #[serde(default)]
    pub use_hash: bool,
}

fn default_delay_ms() -> u64 {
    200
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            while_running: TriggerWhileRunningBehaviour::Queue,
            use_hash: false,
        }
    }
}

/// `[build]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildSection {
    /// Task names run one after another at startup.
    #[serde(default = "default_sequence")]
    pub sequence: Vec<String>,
}

fn default_sequence() -> Vec<String> {
    ["css", "js", "images", "html"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            sequence: default_sequence(),
        }
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskConfig {
    /// Transform chain to run.
    pub kind: TaskKind,

    /// Source glob, relative to the project root.
    pub src: String,

    /// Destination directory, relative to the project root.
    pub dest: String,

    /// Bundle file name for `js` tasks. The minified copy is named by
    /// inserting `.min` before the extension.
    #[serde(default)]
    pub bundle: Option<String>,
}

impl TaskConfig {
    pub fn new(kind: TaskKind, src: impl Into<String>, dest: impl Into<String>) -> Self {
        Self {
            kind,
            src: src.into(),
            dest: dest.into(),
            bundle: None,
        }
    }

    /// Effective bundle name (`main.js` unless overridden).
    pub fn effective_bundle(&self) -> &str {
        self.bundle.as_deref().unwrap_or("main.js")
    }
}

/// The task table used when the config declares no tasks.
pub fn default_tasks() -> BTreeMap<String, TaskConfig> {
    let mut tasks = BTreeMap::new();
    tasks.insert(
        "css".to_string(),
        TaskConfig::new(TaskKind::Css, "src/css/*.scss", "dist/assets/css"),
    );
    tasks.insert(
        "js".to_string(),
        TaskConfig::new(TaskKind::Js, "src/js/*.js", "dist/assets/js"),
    );
    tasks.insert(
        "images".to_string(),
        TaskConfig::new(TaskKind::Copy, "src/images/**/*", "dist/assets/images"),
    );
    tasks.insert(
        "html".to_string(),
        TaskConfig::new(TaskKind::Copy, "src/*.html", "dist"),
    );
    tasks
}
