//! Clap derive structures for the `seedctl` CLI.
//!
//! Only connection and output options are clap flags. Everything after
//! them is a seedctl command line, handed word for word to the core
//! dispatcher.

use std::path::PathBuf;

use clap::{Args, Parser, ValueEnum};
use clap_complete::Shell;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// seedctl -- filter-driven control of a Transmission daemon
#[derive(Debug, Parser)]
#[command(
    name = "seedctl",
    version,
    about = "Control a Transmission daemon from the command line",
    long_about = "Control a Transmission daemon from the command line.\n\n\
        Everything after the options is a seedctl command, e.g.\n  \
        seedctl ls 'seeds<5&ratio<1'\n  \
        seedctl stop downloading ';' start seeding\n\n\
        Run `seedctl help` for the command list and `seedctl help filter`\n\
        for the filter language.",
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    /// Generate shell completions and exit
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<Shell>,

    /// Command line to run; chain with ';', '&' or '|'
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Daemon profile to use
    #[arg(long, short = 'p', env = "SEEDCTL_PROFILE")]
    pub profile: Option<String>,

    /// Daemon RPC URL (overrides profile)
    #[arg(long, short = 'u', env = "SEEDCTL_URL")]
    pub url: Option<String>,

    /// RPC username (overrides profile)
    #[arg(long, env = "SEEDCTL_USERNAME")]
    pub username: Option<String>,

    /// RPC password (overrides profile)
    #[arg(long, env = "SEEDCTL_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(long, short = 'o', env = "SEEDCTL_OUTPUT", default_value = "table")]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto")]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "SEEDCTL_INSECURE")]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "SEEDCTL_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Config file to read instead of the default location
    #[arg(long, env = "SEEDCTL_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Run this rc script before the command
    #[arg(long, value_name = "PATH", conflicts_with = "no_rc")]
    pub rc: Option<PathBuf>,

    /// Skip the default rc script
    #[arg(long)]
    pub no_rc: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one id per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn command_words_keep_their_flags() {
        let cli = Cli::parse_from(["seedctl", "-o", "json", "rm", "-d", "ubuntu"]);
        assert_eq!(cli.global.output, OutputFormat::Json);
        assert_eq!(cli.command, vec!["rm", "-d", "ubuntu"]);
    }
}
