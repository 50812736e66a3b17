// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `cyclexec`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cyclexec",
    version,
    about = "Run an application at a fixed period with checkpoints and fork/join stages.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Cyclexec.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CYCLEXEC_LOG` or `info` is used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate the config and print it, without running anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Request a clean stop after this many cycles instead of waiting for
    /// SIGINT/SIGTERM.
    #[arg(long, value_name = "N")]
    pub cycles: Option<u64>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = CliArgs::try_parse_from(["cyclexec"]).unwrap();
        assert_eq!(args.config, "Cyclexec.toml");
        assert!(!args.dry_run);
        assert_eq!(args.cycles, None);
        assert_eq!(args.log_level, None);
    }

    #[test]
    fn all_flags() {
        let args = CliArgs::try_parse_from([
            "cyclexec",
            "--config",
            "x.toml",
            "--log-level",
            "debug",
            "--dry-run",
            "--cycles",
            "5",
        ])
        .unwrap();
        assert_eq!(args.config, "x.toml");
        assert_eq!(args.log_level, Some(LogLevel::Debug));
        assert!(args.dry_run);
        assert_eq!(args.cycles, Some(5));
    }
}
