// rest/validate.rs — per-operation request body validation.
//
// Each write operation has a validation function that takes the raw JSON
// body and returns either a typed request or the field that failed.
// Validation never touches the store.

use serde_json::Value;

use crate::store::TaskPatch;

/// A rejected field plus the reason, serialized into the 400 response body.
#[derive(Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: &'static str,
}

impl FieldError {
    fn new(field: &str, message: &'static str) -> Self {
        Self {
            field: field.to_string(),
            message,
        }
    }
}

/// Validated `POST /api/tasks` body.
#[derive(Debug, PartialEq, Eq)]
pub struct CreateTask {
    pub text: String,
    pub completed: bool,
}

pub fn create_body(body: &Value) -> Result<CreateTask, FieldError> {
    let obj = body
        .as_object()
        .ok_or_else(|| FieldError::new("body", "must be a JSON object"))?;

    for key in obj.keys() {
        if key != "text" && key != "completed" {
            return Err(FieldError::new(key, "unknown field"));
        }
    }

    let text = match obj.get("text") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::String(_)) => return Err(FieldError::new("text", "must not be empty")),
        Some(_) => return Err(FieldError::new("text", "must be a string")),
        None => return Err(FieldError::new("text", "is required")),
    };

    let completed = match obj.get("completed") {
        Some(Value::Bool(b)) => *b,
        Some(_) => return Err(FieldError::new("completed", "must be a boolean")),
        None => false,
    };

    Ok(CreateTask { text, completed })
}

pub fn update_body(body: &Value) -> Result<TaskPatch, FieldError> {
    let obj = body
        .as_object()
        .ok_or_else(|| FieldError::new("body", "must be a JSON object"))?;

    for key in obj.keys() {
        if key != "text" && key != "completed" {
            return Err(FieldError::new(key, "unknown field"));
        }
    }

    let mut patch = TaskPatch::default();

    if let Some(v) = obj.get("text") {
        match v {
            Value::String(s) if !s.trim().is_empty() => patch.text = Some(s.trim().to_string()),
            Value::String(_) => return Err(FieldError::new("text", "must not be empty")),
            _ => return Err(FieldError::new("text", "must be a string")),
        }
    }

    if let Some(v) = obj.get("completed") {
        match v {
            Value::Bool(b) => patch.completed = Some(*b),
            _ => return Err(FieldError::new("completed", "must be a boolean")),
        }
    }

    Ok(patch)
}
