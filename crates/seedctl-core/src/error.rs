// ── Core error types ──
//
// User-facing errors from seedctl-core. Parse and bind failures are
// raised before any remote call; remote failures arrive either as a
// whole-call connectivity error or as per-entity rejections inside a
// mutation report.

use thiserror::Error;

use crate::filter::FilterError;
use crate::remote::{Cause, ClientError};

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Parse errors ─────────────────────────────────────────────────
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// A filter or sort argument of a command failed to parse.
    #[error("{command}: {source}")]
    FilterSyntax {
        command: String,
        /// Token index of the offending argument in the command line.
        index: usize,
        /// The argument text the offset in `source` refers to.
        input: String,
        source: FilterError,
    },

    /// Command line tokenizing or chaining error.
    #[error("{message}")]
    Syntax { message: String, offset: usize },

    // ── Binding errors ───────────────────────────────────────────────
    #[error("Unknown command: {name}")]
    UnknownCommand { name: String },

    #[error("{command}: unknown option '{flag}'")]
    UnknownFlag {
        command: String,
        flag: String,
        index: usize,
    },

    #[error("{command}: missing argument {name}")]
    MissingArgument { command: String, name: String },

    #[error("{command}: invalid {name} '{value}': expected {expected}")]
    ArgumentType {
        command: String,
        name: String,
        value: String,
        expected: String,
        index: usize,
    },

    #[error("{command}: unexpected argument '{value}'")]
    UnexpectedArgument {
        command: String,
        value: String,
        index: usize,
    },

    // ── Settings ─────────────────────────────────────────────────────
    #[error("Unknown setting: {name}")]
    UnknownSetting { name: String },

    #[error("Invalid value for {name}: {reason}")]
    Setting { name: String, reason: String },

    // ── Remote errors ────────────────────────────────────────────────
    #[error("{message}")]
    Connectivity { message: String, cause: Cause },

    #[error("{id}: {reason}")]
    RemoteRejection { id: String, reason: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("{message}")]
    Refused { message: String },

    #[error("No matching {what}")]
    NoMatch { what: String },

    #[error("{path}: {reason}")]
    Script { path: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Argument parsing or binding failure (usage error).
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Self::Filter(_)
                | Self::FilterSyntax { .. }
                | Self::Syntax { .. }
                | Self::UnknownCommand { .. }
                | Self::UnknownFlag { .. }
                | Self::MissingArgument { .. }
                | Self::ArgumentType { .. }
                | Self::UnexpectedArgument { .. }
                | Self::UnknownSetting { .. }
                | Self::Setting { .. }
        )
    }

    pub fn refused(message: impl Into<String>) -> Self {
        Self::Refused {
            message: message.into(),
        }
    }
}

// ── Conversion from remote errors ────────────────────────────────────

impl From<ClientError> for CoreError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Connectivity { message, cause } => Self::Connectivity { message, cause },
            ClientError::Rejected { reason } => Self::RemoteRejection {
                id: "daemon".into(),
                reason,
            },
        }
    }
}

impl From<seedctl_api::Error> for CoreError {
    fn from(err: seedctl_api::Error) -> Self {
        ClientError::from(err).into()
    }
}
