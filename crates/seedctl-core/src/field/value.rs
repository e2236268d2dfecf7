// ── Typed field values ──

use std::borrow::Cow;
use std::cmp::Ordering;

use serde::Serialize;
use strum::Display;

/// The type of a field, which decides literal parsing, legal operators
/// and formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ValueType {
    Integer,
    Ratio,
    Percent,
    Bytes,
    Rate,
    Duration,
    Timestamp,
    Status,
    Text,
    Path,
    Bool,
}

impl ValueType {
    /// Whether `~` and `=~` apply to this type.
    pub fn is_textual(self) -> bool {
        matches!(self, Self::Text | Self::Path | Self::Status)
    }
}

/// A field value read from an entity, or a parsed literal.
///
/// Sentinels: unknown durations are `i64::MAX`, unknown timestamps are 0
/// and an unlimited rate is `u64::MAX`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Int(i64),
    Float(f64),
    Bytes(u64),
    Duration(i64),
    Timestamp(i64),
    Status { rank: u8, name: &'static str },
    Text(Cow<'a, str>),
    Bool(bool),
}

pub const UNKNOWN_DURATION: i64 = i64::MAX;
pub const UNLIMITED: u64 = u64::MAX;

impl Value<'_> {
    pub fn text(s: &str) -> Value<'_> {
        Value::Text(Cow::Borrowed(s))
    }

    pub fn into_owned(self) -> Value<'static> {
        match self {
            Value::Int(v) => Value::Int(v),
            Value::Float(v) => Value::Float(v),
            Value::Bytes(v) => Value::Bytes(v),
            Value::Duration(v) => Value::Duration(v),
            Value::Timestamp(v) => Value::Timestamp(v),
            Value::Status { rank, name } => Value::Status { rank, name },
            Value::Text(s) => Value::Text(Cow::Owned(s.into_owned())),
            Value::Bool(v) => Value::Bool(v),
        }
    }

    /// String view for textual values (status values read as their name).
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Status { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Whether the value differs from its type's zero value.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(v) => *v != 0,
            Value::Float(v) => v.abs() > 0.0,
            Value::Bytes(v) => *v != 0,
            Value::Duration(v) => *v != 0 && *v != UNKNOWN_DURATION,
            Value::Timestamp(v) => *v != 0,
            Value::Status { .. } => true,
            Value::Text(s) => !s.is_empty(),
            Value::Bool(v) => *v,
        }
    }

    fn discriminant(&self) -> u8 {
        match self {
            Value::Int(_) => 0,
            Value::Float(_) => 1,
            Value::Bytes(_) => 2,
            Value::Duration(_) => 3,
            Value::Timestamp(_) => 4,
            Value::Status { .. } => 5,
            Value::Text(_) => 6,
            Value::Bool(_) => 7,
        }
    }

    /// Total order. Values of different variants order by variant, which
    /// never happens for values of one field.
    pub fn compare(&self, other: &Value<'_>) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b))
            | (Value::Duration(a), Value::Duration(b))
            | (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
            (
                Value::Status { rank: a, name: na },
                Value::Status { rank: b, name: nb },
            ) => a.cmp(b).then_with(|| na.cmp(nb)),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            _ => self.discriminant().cmp(&other.discriminant()),
        }
    }
}
