//! Typed access to tool call arguments.

use serde_json::{Map, Value};

use crate::error::MuxError;

/// Wrapper around tool call arguments providing typed extraction.
#[derive(Debug, Clone)]
pub struct ToolArguments {
    value: Value,
}

impl ToolArguments {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// Arguments with no keys.
    pub fn empty() -> Self {
        Self::new(Value::Object(Map::new()))
    }

    /// Get the raw JSON value.
    pub fn raw(&self) -> &Value {
        &self.value
    }

    pub fn into_raw(self) -> Value {
        self.value
    }

    /// Normalize into a JSON object.
    ///
    /// `null` and blank strings yield `None`; a string holding a JSON object is parsed.
    pub fn to_object(&self) -> Result<Option<Map<String, Value>>, MuxError> {
        coerce_object(self.value.clone())
    }
}

impl From<Value> for ToolArguments {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

fn coerce_object(value: Value) -> Result<Option<Map<String, Value>>, MuxError> {
    match value {
        Value::Null => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        Value::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            let parsed: Value = serde_json::from_str(trimmed).map_err(|e| {
                MuxError::InvalidArgument(format!("Tool arguments must be valid JSON: {e}"))
            })?;
            match parsed {
                Value::String(_) => Err(MuxError::InvalidArgument(
                    "Tool arguments must be a JSON object; got a nested string".into(),
                )),
                other => coerce_object(other),
            }
        }
        other => Err(MuxError::InvalidArgument(format!(
            "Tool arguments must be a JSON object; got {other}"
        ))),
    }
}
