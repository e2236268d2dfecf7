// ── Predicate evaluation ──

use std::cmp::Ordering;

use super::ast::{CmpOp, Comparison, Operand, Predicate};
use crate::field::{FieldRegistry, Value};

/// Evaluate `predicate` against `entity`. Pure; never fails.
pub(crate) fn eval<E>(registry: &FieldRegistry<E>, predicate: &Predicate, entity: &E) -> bool {
    match predicate {
        Predicate::Compare(c) => compare(registry, c, entity),
        Predicate::Flag(name) => registry.flag(name).is_some_and(|f| f.test(entity)),
        Predicate::Truthy(name) => registry
            .field(name)
            .is_some_and(|f| f.value(entity).is_truthy()),
        Predicate::Not(inner) => !eval(registry, inner, entity),
        Predicate::And(l, r) => eval(registry, l, entity) && eval(registry, r, entity),
        Predicate::Or(l, r) => eval(registry, l, entity) || eval(registry, r, entity),
    }
}

fn compare<E>(registry: &FieldRegistry<E>, c: &Comparison, entity: &E) -> bool {
    let Some(spec) = registry.field(c.field) else {
        return false;
    };
    let value = spec.value(entity);
    match (&c.operand, c.op) {
        (Operand::Pattern(p), _) => value.as_str().is_some_and(|s| p.is_match(s)),
        (Operand::Value(lit), CmpOp::Contains) => match (value.as_str(), lit.as_str()) {
            (Some(hay), Some(needle)) => contains_smart_case(hay, needle),
            _ => false,
        },
        (Operand::Value(lit), op) => {
            let ord = match (&value, lit) {
                (Value::Status { name: a, .. }, Value::Status { name: b, .. })
                    if matches!(op, CmpOp::Eq | CmpOp::Ne) =>
                {
                    a.cmp(b)
                }
                _ => value.compare(lit),
            };
            match op {
                CmpOp::Eq => ord == Ordering::Equal,
                CmpOp::Ne => ord != Ordering::Equal,
                CmpOp::Lt => ord == Ordering::Less,
                CmpOp::Le => ord != Ordering::Greater,
                CmpOp::Gt => ord == Ordering::Greater,
                CmpOp::Ge => ord != Ordering::Less,
                CmpOp::Contains | CmpOp::Regex => false,
            }
        }
    }
}

/// Case-insensitive unless `needle` has an uppercase character.
fn contains_smart_case(hay: &str, needle: &str) -> bool {
    if needle.chars().any(char::is_uppercase) {
        hay.contains(needle)
    } else {
        hay.to_lowercase().contains(needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smart_case() {
        assert!(contains_smart_case("Ubuntu ISO", "ubuntu"));
        assert!(contains_smart_case("Ubuntu ISO", "Ubuntu"));
        assert!(!contains_smart_case("ubuntu iso", "Ubuntu"));
    }
}
