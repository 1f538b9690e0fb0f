use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Behaviour when a task is triggered again while it is still running.
///
/// - `Queue`: remember the trigger and run the task once more when the
///   current run finishes (default behaviour). Any number of triggers during
///   one run collapse into a single extra run.
/// - `Ignore`: drop the trigger; the running instance already covers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerWhileRunningBehaviour {
    #[default]
    Queue,
    Ignore,
}

impl FromStr for TriggerWhileRunningBehaviour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "queue" => Ok(TriggerWhileRunningBehaviour::Queue),
            "ignore" => Ok(TriggerWhileRunningBehaviour::Ignore),
            other => Err(format!(
                "invalid while_running: {other} (expected \"queue\" or \"ignore\")"
            )),
        }
    }
}

/// Which transform chain a task runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Sass → prefixed, minified `*.min.css`.
    Css,
    /// Concatenate into one bundle, then write a minified copy.
    Js,
    /// Byte-for-byte copy (images, html).
    Copy,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskKind::Css => "css",
            TaskKind::Js => "js",
            TaskKind::Copy => "copy",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn while_running_parses_case_insensitively() {
        assert_eq!(
            " Queue ".parse::<TriggerWhileRunningBehaviour>(),
            Ok(TriggerWhileRunningBehaviour::Queue)
        );
        assert_eq!(
            "IGNORE".parse::<TriggerWhileRunningBehaviour>(),
            Ok(TriggerWhileRunningBehaviour::Ignore)
        );
        assert!("cancel".parse::<TriggerWhileRunningBehaviour>().is_err());
    }
}
