// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `assetpipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetpipe",
    version,
    about = "Build static front-end assets and rebuild them as sources change.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Assetpipe.toml` in the current working directory; built-in
    /// defaults are used when that file does not exist.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Load and validate the config, print the task table, run nothing.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// What to do after the startup build sequence.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Build once, then rebuild tasks whose sources change (default).
    #[default]
    Watch,
    /// Build once, then serve the output with live reload and rebuild on
    /// change.
    Serve,
    /// Build once and exit.
    Build,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_watch() {
        let args = CliArgs::try_parse_from(["assetpipe"]).unwrap();
        assert_eq!(args.command, None);
        assert_eq!(args.command.unwrap_or_default(), Command::Watch);
        assert!(args.config.is_none());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let args = CliArgs::try_parse_from([
            "assetpipe",
            "serve",
            "--config",
            "site/Assetpipe.toml",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(args.command, Some(Command::Serve));
        assert_eq!(args.config.as_deref(), Some("site/Assetpipe.toml"));
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(CliArgs::try_parse_from(["assetpipe", "deploy"]).is_err());
    }
}
