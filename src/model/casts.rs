//! Stock type casters for [`ModelSchemaBuilder::cast`](super::ModelSchemaBuilder::cast).
//!
//! Each caster leaves `null` untouched.

use super::{kind_of, CastError, ModelDraft};
use serde_json::{Number, Value};

pub fn integer(value: Value, _draft: &ModelDraft<'_>) -> Result<Value, CastError> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(Value::Number(n)),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
                Ok(Value::from(f as i64))
            }
            _ => Err(CastError::new(format!("{} is not an integer", n))),
        },
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| CastError::new(format!("{:?} is not an integer", s))),
        Value::Bool(b) => Ok(Value::from(i64::from(b))),
        other => Err(CastError::new(format!("cannot cast {} to an integer", kind_of(&other)))),
    }
}

pub fn float(value: Value, _draft: &ModelDraft<'_>) -> Result<Value, CastError> {
    let parsed = match &value {
        Value::Null => return Ok(Value::Null),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| CastError::new(format!("cannot cast {} to a float", kind_of(&value))))
}

pub fn boolean(value: Value, _draft: &ModelDraft<'_>) -> Result<Value, CastError> {
    match value {
        Value::Null | Value::Bool(_) => Ok(value),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(Value::Bool(false)),
            Some(1) => Ok(Value::Bool(true)),
            _ => Err(CastError::new(format!("{} is not a boolean", n))),
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Value::Bool(true)),
            "false" | "0" | "no" | "off" | "" => Ok(Value::Bool(false)),
            _ => Err(CastError::new(format!("{:?} is not a boolean", s))),
        },
        other => Err(CastError::new(format!("cannot cast {} to a boolean", kind_of(&other)))),
    }
}

pub fn string(value: Value, _draft: &ModelDraft<'_>) -> Result<Value, CastError> {
    match value {
        Value::Null | Value::String(_) => Ok(value),
        Value::Number(n) => Ok(Value::String(n.to_string())),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        other => Err(CastError::new(format!("cannot cast {} to a string", kind_of(&other)))),
    }
}
