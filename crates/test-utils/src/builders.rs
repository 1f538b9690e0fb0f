#![allow(dead_code)]

use assetpipe::config::{ConfigFile, RawConfigFile, TaskConfig};
use assetpipe::errors::Result;
use assetpipe::types::{TaskKind, TriggerWhileRunningBehaviour};

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the built-in defaults with an empty task table; adding no
/// task at all yields the default css/js/images/html tasks.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_sequence(mut self, names: &[&str]) -> Self {
        self.config.build.sequence = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_grid(mut self, columns: u32, max_width: u32, gutter: u32) -> Self {
        self.config.grid.columns = columns;
        self.config.grid.max_width = max_width;
        self.config.grid.gutter = gutter;
        self
    }

    pub fn with_browsers(mut self, queries: &[&str]) -> Self {
        self.config.css.browsers = queries.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_while_running(mut self, behaviour: TriggerWhileRunningBehaviour) -> Self {
        self.config.watch.while_running = behaviour;
        self
    }

    pub fn with_use_hash(mut self, val: bool) -> Self {
        self.config.watch.use_hash = val;
        self
    }

    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.config.watch.delay_ms = delay_ms;
        self
    }

    pub fn with_server_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(kind: TaskKind, src: &str, dest: &str) -> Self {
        Self {
            task: TaskConfig::new(kind, src, dest),
        }
    }

    pub fn css(src: &str, dest: &str) -> Self {
        Self::new(TaskKind::Css, src, dest)
    }

    pub fn js(src: &str, dest: &str) -> Self {
        Self::new(TaskKind::Js, src, dest)
    }

    pub fn copy(src: &str, dest: &str) -> Self {
        Self::new(TaskKind::Copy, src, dest)
    }

    pub fn bundle(mut self, name: &str) -> Self {
        self.task.bundle = Some(name.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
