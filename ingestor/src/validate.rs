use crate::errors::{Error, Result};
use serde_json::Value;

/// Extracts the numeric telemetry value from a request body.
/// Booleans are stored as 1/0.
pub fn telemetry_value(body: &Value) -> Result<f64> {
    let value = body
        .get("value")
        .ok_or_else(|| Error::Validation("value must not be empty".to_string()))?;

    match value {
        Value::Bool(flag) => Ok(if *flag { 1.0 } else { 0.0 }),
        Value::Number(number) => number
            .as_f64()
            .filter(|v| v.is_finite())
            .ok_or_else(|| Error::Validation(format!("value {} is not a finite number", number))),
        Value::Null => Err(Error::Validation("value must not be empty".to_string())),
        other => Err(Error::Validation(format!(
            "value must be a number, got {}",
            other
        ))),
    }
}
