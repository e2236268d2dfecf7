//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and process exit codes.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use seedctl_config::ConfigError;
use seedctl_core::CoreError;
use seedctl_core::remote::Cause;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PARTIAL: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the daemon: {message}")]
    #[diagnostic(
        code(seedctl::connection_failed),
        help(
            "Check that transmission-daemon is running and its RPC port is reachable.\n\
             Set the URL with --url or `url` in your profile."
        )
    )]
    ConnectionFailed { message: String },

    #[error("Request timed out: {message}")]
    #[diagnostic(
        code(seedctl::timeout),
        help("Increase the timeout with --timeout or check daemon responsiveness.")
    )]
    Timeout { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(seedctl::auth_failed),
        help(
            "Verify the RPC username and password.\n\
             Use --username/--password, SEEDCTL_PASSWORD, or password_env in your profile."
        )
    )]
    AuthFailed { message: String },

    // ── Command line ─────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(seedctl::filter_syntax), help("Run: seedctl help filter"))]
    FilterSyntax {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("{label}")]
        span: SourceSpan,
        label: String,
    },

    #[error("Unknown command: {name}")]
    #[diagnostic(
        code(seedctl::unknown_command),
        help("Run: seedctl help to list commands")
    )]
    UnknownCommand { name: String },

    #[error("{message}")]
    #[diagnostic(code(seedctl::usage))]
    Usage {
        message: String,
        #[help]
        help: Option<String>,
    },

    // ── Daemon answers ───────────────────────────────────────────────
    #[error("No matching {what}")]
    #[diagnostic(
        code(seedctl::no_match),
        help("Run: seedctl ls to see torrents, or loosen the filter")
    )]
    NoMatch { what: String },

    #[error("Daemon refused: {message}")]
    #[diagnostic(code(seedctl::rejected))]
    Rejected { message: String },

    #[error("{message}")]
    #[diagnostic(code(seedctl::refused))]
    Refused { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(seedctl::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Add one under [profiles.{name}] in {path}"
        )
    )]
    ProfileNotFound {
        name: String,
        available: String,
        path: String,
    },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(seedctl::validation))]
    Validation { field: String, reason: String },

    #[error("{message}")]
    #[diagnostic(code(seedctl::config))]
    Config { message: String },

    #[error("{path}: {reason}")]
    #[diagnostic(code(seedctl::script))]
    Script { path: String, reason: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not encode JSON output: {0}")]
    #[diagnostic(code(seedctl::json))]
    Json(#[from] serde_json::Error),

    #[error("Could not encode YAML output: {0}")]
    #[diagnostic(code(seedctl::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NoMatch { .. } => exit_code::NOT_FOUND,
            Self::FilterSyntax { .. }
            | Self::UnknownCommand { .. }
            | Self::Usage { .. }
            | Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    fn usage(message: String, help: impl Into<String>) -> Self {
        Self::Usage {
            message,
            help: Some(help.into()),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::FilterSyntax {
                command,
                index,
                input,
                source,
            } => {
                let offset = source.offset().min(input.len());
                let len = source.span_len().min(input.len() - offset);
                CliError::FilterSyntax {
                    message,
                    label: source.to_string(),
                    src: NamedSource::new(format!("{command} argument {index}"), input),
                    span: (offset, len).into(),
                }
            }

            CoreError::Filter(_) | CoreError::Syntax { .. } => CliError::Usage {
                message,
                help: None,
            },

            CoreError::UnknownCommand { name } => CliError::UnknownCommand { name },

            CoreError::UnknownFlag { command, .. }
            | CoreError::MissingArgument { command, .. }
            | CoreError::ArgumentType { command, .. }
            | CoreError::UnexpectedArgument { command, .. } => {
                CliError::usage(message, format!("Run: seedctl help {command}"))
            }

            CoreError::UnknownSetting { .. } | CoreError::Setting { .. } => {
                CliError::usage(message, "Run: seedctl settings")
            }

            CoreError::Connectivity { message, cause } => match cause {
                Cause::Auth => CliError::AuthFailed { message },
                Cause::Timeout => CliError::Timeout { message },
                Cause::Network => CliError::ConnectionFailed { message },
            },

            CoreError::RemoteRejection { .. } => CliError::Rejected { message },

            CoreError::Refused { message } => CliError::Refused { message },

            CoreError::NoMatch { what } => CliError::NoMatch { what },

            CoreError::Script { path, reason } => CliError::Script { path, reason },

            CoreError::Io(e) => CliError::Io(e),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: String::new(),
                path: seedctl_config::config_path().display().to_string(),
            },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}
