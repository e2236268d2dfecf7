// ── Filter errors ──

use thiserror::Error;

use crate::field::ValueType;
use crate::model::EntityKind;

/// Error from parsing a filter or sort expression.
///
/// Every variant carries the byte offset of the offending token inside
/// the expression text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("{message}: {token:?} at offset {offset}")]
    Syntax {
        message: String,
        token: String,
        offset: usize,
    },

    #[error("Unknown {kind} field: {name}")]
    UnknownField {
        kind: EntityKind,
        name: String,
        offset: usize,
    },

    #[error("Operator {op} does not apply to {field} ({ty})")]
    InvalidOperator {
        field: String,
        op: String,
        ty: ValueType,
        offset: usize,
    },

    #[error("Invalid value {value:?} for {field}: {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
        offset: usize,
    },
}

impl FilterError {
    pub fn offset(&self) -> usize {
        match self {
            Self::Syntax { offset, .. }
            | Self::UnknownField { offset, .. }
            | Self::InvalidOperator { offset, .. }
            | Self::InvalidValue { offset, .. } => *offset,
        }
    }

    /// Length of the offending token, at least 1, for source spans.
    pub fn span_len(&self) -> usize {
        let len = match self {
            Self::Syntax { token, .. } => token.len(),
            Self::UnknownField { name, .. } => name.len(),
            Self::InvalidOperator { op, .. } => op.len(),
            Self::InvalidValue { value, .. } => value.len(),
        };
        len.max(1)
    }

    /// Shift offsets by `base`, for expressions embedded in larger text.
    #[must_use]
    pub fn shifted(mut self, base: usize) -> Self {
        match &mut self {
            Self::Syntax { offset, .. }
            | Self::UnknownField { offset, .. }
            | Self::InvalidOperator { offset, .. }
            | Self::InvalidValue { offset, .. } => *offset += base,
        }
        self
    }
}
