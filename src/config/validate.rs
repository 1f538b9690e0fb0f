// src/config/validate.rs

use std::collections::{BTreeMap, HashSet};
use std::path::{Component, Path};

use lightningcss::targets::Browsers;

use crate::config::model::{ConfigFile, RawConfigFile, default_tasks};
use crate::errors::{AssetpipeError, Result};
use crate::pipeline::sources::SourceGlob;
use crate::types::TaskKind;

/// Upper bound for `[watch].delay_ms`.
const MAX_DELAY_MS: u64 = 60_000;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = AssetpipeError;

    fn try_from(mut raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        if raw.task.is_empty() {
            raw.task = default_tasks();
        }
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_global_config(cfg)?;
    validate_browsers(&cfg.css.browsers)?;
    validate_tasks(cfg)?;
    validate_destinations(cfg)?;
    validate_sequence(cfg)?;
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.grid.columns == 0 {
        return Err(config_error("[grid].columns must be >= 1 (got 0)"));
    }
    if cfg.grid.max_width == 0 {
        return Err(config_error("[grid].max_width must be >= 1 (got 0)"));
    }
    if cfg.server.port == 0 {
        return Err(config_error("[server].port must be a fixed port (got 0)"));
    }
    if cfg.server.base_dir.trim().is_empty() {
        return Err(config_error("[server].base_dir must not be empty"));
    }
    if cfg.watch.delay_ms > MAX_DELAY_MS {
        return Err(AssetpipeError::ConfigError(format!(
            "[watch].delay_ms must be <= {MAX_DELAY_MS} (got {})",
            cfg.watch.delay_ms
        )));
    }
    Ok(())
}

fn validate_browsers(queries: &[String]) -> Result<()> {
    if queries.is_empty() {
        return Err(config_error("[css].browsers must list at least one query"));
    }
    match Browsers::from_browserslist(queries.iter()) {
        Ok(_) => Ok(()),
        Err(err) => Err(AssetpipeError::ConfigError(format!(
            "[css].browsers is not a valid browserslist query: {err}"
        ))),
    }
}

fn validate_tasks(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        SourceGlob::new(&task.src).map_err(|err| {
            AssetpipeError::ConfigError(format!("task '{name}' has an invalid `src`: {err}"))
        })?;

        if task.dest.trim().is_empty() {
            return Err(AssetpipeError::ConfigError(format!(
                "task '{name}' must have a non-empty `dest`"
            )));
        }

        match (task.kind, task.bundle.as_deref()) {
            (TaskKind::Js, Some(bundle)) => {
                if bundle.is_empty() || bundle.contains('/') || bundle.contains('\\') {
                    return Err(AssetpipeError::ConfigError(format!(
                        "task '{name}' has an invalid `bundle` '{bundle}' (expected a bare file name)"
                    )));
                }
            }
            (TaskKind::Js, None) => {}
            (kind, Some(_)) => {
                return Err(AssetpipeError::ConfigError(format!(
                    "task '{name}' sets `bundle`, which only applies to js tasks (kind is {kind})"
                )));
            }
            (_, None) => {}
        }
    }
    Ok(())
}

fn validate_destinations(cfg: &RawConfigFile) -> Result<()> {
    let mut seen: BTreeMap<String, &str> = BTreeMap::new();
    for (name, task) in cfg.task.iter() {
        let key = normalized_dir(&task.dest);
        if let Some(other) = seen.insert(key, name.as_str()) {
            return Err(AssetpipeError::ConfigError(format!(
                "tasks '{other}' and '{name}' write to the same destination '{}'",
                task.dest
            )));
        }
    }
    Ok(())
}

fn validate_sequence(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();
    for name in cfg.build.sequence.iter() {
        if !cfg.task.contains_key(name) {
            return Err(AssetpipeError::ConfigError(format!(
                "[build].sequence references unknown task '{name}'"
            )));
        }
        if !seen.insert(name.as_str()) {
            return Err(AssetpipeError::ConfigError(format!(
                "[build].sequence lists task '{name}' more than once"
            )));
        }
    }
    Ok(())
}

/// Normalise `./dist/`, `dist` and `dist/.` to the same key.
fn normalized_dir(dir: &str) -> String {
    Path::new(dir)
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn config_error(msg: &str) -> AssetpipeError {
    AssetpipeError::ConfigError(msg.to_string())
}
