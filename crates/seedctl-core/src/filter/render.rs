// ── Canonical rendering ──
//
// Prints predicate trees back to filter syntax with canonical names and
// the fewest parentheses that preserve the tree shape, so parsing the
// output yields the same tree.

use std::fmt::{self, Write};

use chrono::{DateTime, SecondsFormat, Utc};

use super::ast::{Operand, Predicate};
use super::lexer::is_special;
use crate::field::{UNLIMITED, Value};

const OR: u8 = 1;
const AND: u8 = 2;
const UNARY: u8 = 3;

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_predicate(f, self, OR)
    }
}

fn write_predicate(f: &mut fmt::Formatter<'_>, p: &Predicate, ctx: u8) -> fmt::Result {
    match p {
        Predicate::Or(l, r) => wrap(f, ctx > OR, |f| {
            write_predicate(f, l, OR)?;
            f.write_str(" | ")?;
            write_predicate(f, r, AND)
        }),
        Predicate::And(l, r) => wrap(f, ctx > AND, |f| {
            write_predicate(f, l, AND)?;
            f.write_str(" & ")?;
            write_predicate(f, r, UNARY)
        }),
        Predicate::Not(inner) => {
            f.write_char('!')?;
            write_predicate(f, inner, UNARY)
        }
        Predicate::Flag(name) | Predicate::Truthy(name) => f.write_str(name),
        Predicate::Compare(c) => {
            write!(f, "{}{}", c.field, c.op.symbol())?;
            match &c.operand {
                Operand::Value(v) => f.write_str(&literal(v)),
                Operand::Pattern(p) => f.write_str(&quote(p.source())),
            }
        }
    }
}

fn wrap(
    f: &mut fmt::Formatter<'_>,
    parens: bool,
    body: impl FnOnce(&mut fmt::Formatter<'_>) -> fmt::Result,
) -> fmt::Result {
    if parens {
        f.write_char('(')?;
        body(f)?;
        f.write_char(')')
    } else {
        body(f)
    }
}

/// Literal text that parses back to `value` for a field of its type.
pub(crate) fn literal(value: &Value<'_>) -> String {
    match value {
        Value::Int(i) => i.to_string(),
        Value::Float(x) => x.to_string(),
        Value::Bytes(n) if *n == UNLIMITED => "unlimited".to_owned(),
        Value::Bytes(n) => n.to_string(),
        Value::Duration(d) => format!("{d}s"),
        Value::Timestamp(ts) => DateTime::<Utc>::from_timestamp(*ts, 0).map_or_else(
            || ts.to_string(),
            |dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
        Value::Status { name, .. } => (*name).to_owned(),
        Value::Text(s) => quote(s),
        Value::Bool(b) => b.to_string(),
    }
}

/// Double-quote `s` unless it lexes as a single bare word.
pub(crate) fn quote(s: &str) -> String {
    let bare = !s.is_empty()
        && !s
            .chars()
            .any(|c| c.is_whitespace() || is_special(c) || matches!(c, '\'' | '"' | '\\'));
    if bare {
        return s.to_owned();
    }
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
