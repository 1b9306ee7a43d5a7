// Start of file: /src/services/vector/filter.rs

// * Metadata filters: `{"field": value}` or `{"field": {"$op": value}}`.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use crate::utils::error_handler::ServiceError;

const OPERATORS: [&str; 7] = ["$eq", "$ne", "$in", "$gt", "$gte", "$lt", "$lte"];

/// Rejects unknown `$` operators before any record is scanned.
pub fn validate(filter: &Map<String, Value>) -> Result<(), ServiceError> {
    for (field, condition) in filter {
        let Value::Object(ops) = condition else { continue };

        for (op, operand) in ops {
            if !op.starts_with('$') {
                continue;
            }
            if !OPERATORS.contains(&op.as_str()) {
                return Err(ServiceError::InvalidInput(format!(
                    "Unsupported filter operator '{op}' on field '{field}'"
                )));
            }
            if op == "$in" && !operand.is_array() {
                return Err(ServiceError::InvalidInput(format!(
                    "Operator '$in' on field '{field}' expects an array"
                )));
            }
        }
    }
    Ok(())
}

fn is_operator_object(condition: &Value) -> bool {
    match condition {
        Value::Object(ops) => !ops.is_empty() && ops.keys().all(|k| k.starts_with('$')),
        _ => false,
    }
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn loosely_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(_), Value::Number(_)) => compare(left, right) == Some(Ordering::Equal),
        _ => left == right,
    }
}

fn apply(op: &str, actual: Option<&Value>, operand: &Value) -> bool {
    match op {
        "$eq" => actual.is_some_and(|v| loosely_equal(v, operand)),
        "$ne" => !actual.is_some_and(|v| loosely_equal(v, operand)),
        "$in" => match (actual, operand) {
            (Some(v), Value::Array(options)) => options.iter().any(|o| loosely_equal(v, o)),
            _ => false,
        },
        "$gt" => actual.and_then(|v| compare(v, operand)) == Some(Ordering::Greater),
        "$gte" => matches!(
            actual.and_then(|v| compare(v, operand)),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        "$lt" => actual.and_then(|v| compare(v, operand)) == Some(Ordering::Less),
        "$lte" => matches!(
            actual.and_then(|v| compare(v, operand)),
            Some(Ordering::Less | Ordering::Equal)
        ),
        _ => false,
    }
}

/// True when every condition holds for `metadata`.
pub fn matches(metadata: &Map<String, Value>, filter: &Map<String, Value>) -> bool {
    filter.iter().all(|(field, condition)| {
        let actual: Option<&Value> = metadata.get(field);

        if is_operator_object(condition) {
            condition
                .as_object()
                .map(|ops| ops.iter().all(|(op, operand)| apply(op, actual, operand)))
                .unwrap_or(false)
        } else {
            actual.is_some_and(|v| loosely_equal(v, condition))
        }
    })
}

// End of file: /src/services/vector/filter.rs
