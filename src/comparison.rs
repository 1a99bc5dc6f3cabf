use std::cmp::Ordering;

use serde_json::Value;

use crate::errors::{Result, ScriptError};

pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(na), Value::Number(nb)) => match (na.as_f64(), nb.as_f64()) {
            (Some(da), Some(db)) => (da - db).abs() < f64::EPSILON,
            _ => na == nb,
        },
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            match (n.as_f64(), s.trim().parse::<f64>()) {
                (Some(d), Ok(p)) => (d - p).abs() < f64::EPSILON,
                _ => false,
            }
        }
        _ => a == b,
    }
}

/// Orders two scalars. Anything that has no natural order against the other
/// side is a runtime error rather than a silent `false`.
pub fn compare_values(a: &Value, b: &Value) -> Result<Ordering> {
    match (a, b) {
        (Value::String(sa), Value::String(sb)) => Ok(sa.cmp(sb)),
        (Value::Number(na), Value::Number(nb)) => {
            cmp_f64(na.as_f64(), nb.as_f64()).ok_or_else(|| unordered(a, b))
        }
        (Value::Bool(ba), Value::Bool(bb)) => Ok(ba.cmp(bb)),
        (Value::Number(n), Value::String(s)) => {
            cmp_f64(n.as_f64(), s.trim().parse().ok()).ok_or_else(|| unordered(a, b))
        }
        (Value::String(s), Value::Number(n)) => {
            cmp_f64(s.trim().parse().ok(), n.as_f64()).ok_or_else(|| unordered(a, b))
        }
        _ => Err(unordered(a, b)),
    }
}

fn cmp_f64(a: Option<f64>, b: Option<f64>) -> Option<Ordering> {
    let (da, db) = (a?, b?);
    if (da - db).abs() < f64::EPSILON {
        Some(Ordering::Equal)
    } else {
        da.partial_cmp(&db)
    }
}

fn unordered(a: &Value, b: &Value) -> ScriptError {
    ScriptError::Runtime(format!("cannot order {} against {}", type_name(a), type_name(b)))
}

pub fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
