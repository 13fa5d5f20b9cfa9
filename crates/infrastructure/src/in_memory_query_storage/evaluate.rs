use std::cmp::Ordering;

use serde_json::Value;
use tablegate_domain::{ColumnRef, CompareOperator, Predicate, Row};

/// One candidate result row: each participating table with its matched row.
/// Unmatched left-joined tables carry `None`.
pub(super) type ScopeEntry<'a> = (&'a str, Option<&'a Row>);

pub(super) fn resolve_value<'a>(scope: &[ScopeEntry<'a>], column: &ColumnRef) -> Option<&'a Value> {
    match column.table.as_deref() {
        Some(table) => scope
            .iter()
            .find(|(name, _)| *name == table)
            .and_then(|(_, row)| *row)
            .and_then(|row| row.get(column.column.as_str())),
        None => scope
            .iter()
            .find_map(|(_, row)| row.and_then(|row| row.get(column.column.as_str()))),
    }
}

pub(super) fn predicate_matches(scope: &[ScopeEntry<'_>], predicate: &Predicate) -> bool {
    match predicate {
        Predicate::All => true,
        Predicate::Compare {
            column,
            operator,
            value,
        } => resolve_value(scope, column)
            .map(|stored| compare_matches(stored, *operator, value))
            .unwrap_or(false),
        Predicate::In { column, values } => resolve_value(scope, column)
            .map(|stored| values.iter().any(|candidate| values_equal(stored, candidate)))
            .unwrap_or(false),
        Predicate::IsNull { column } => resolve_value(scope, column)
            .map(Value::is_null)
            .unwrap_or(true),
        Predicate::And(children) => children.iter().all(|child| predicate_matches(scope, child)),
        Predicate::Or(children) => children.iter().any(|child| predicate_matches(scope, child)),
        Predicate::Not(child) => !predicate_matches(scope, child),
    }
}

fn compare_matches(stored: &Value, operator: CompareOperator, operand: &Value) -> bool {
    let Some(ordering) = compare_values(stored, operand) else {
        return false;
    };

    match operator {
        CompareOperator::Eq => ordering == Ordering::Equal,
        CompareOperator::Neq => ordering != Ordering::Equal,
        CompareOperator::Gt => ordering == Ordering::Greater,
        CompareOperator::Gte => ordering != Ordering::Less,
        CompareOperator::Lt => ordering == Ordering::Less,
        CompareOperator::Lte => ordering != Ordering::Greater,
    }
}

/// Orders two scalars of the same kind. Nulls and mixed kinds are incomparable.
pub(super) fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => match (left.as_i64(), right.as_i64()) {
            (Some(left), Some(right)) => Some(left.cmp(&right)),
            _ => left
                .as_f64()
                .zip(right.as_f64())
                .and_then(|(left, right)| left.partial_cmp(&right)),
        },
        (Value::String(left), Value::String(right)) => Some(left.cmp(right)),
        (Value::Bool(left), Value::Bool(right)) => Some(left.cmp(right)),
        _ => None,
    }
}

pub(super) fn values_equal(left: &Value, right: &Value) -> bool {
    compare_values(left, right) == Some(Ordering::Equal)
}

/// Sort order with nulls first.
pub(super) fn sort_ordering(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    let left = left.filter(|value| !value.is_null());
    let right = right.filter(|value| !value.is_null());

    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(left), Some(right)) => compare_values(left, right).unwrap_or(Ordering::Equal),
    }
}
