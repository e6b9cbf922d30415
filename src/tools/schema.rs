//! Argument validation against tool parameter schemas.
//!
//! Runs before any tool executes. Checks are purely structural: required
//! fields present, primitive types conform, enum values in range. Malformed
//! payloads from the model are rejected here and become failed tool results,
//! so nothing untrusted reaches a tool body.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("arguments must be a JSON object")]
    NotAnObject,

    #[error("missing required field '{0}'")]
    MissingRequired(String),

    #[error("field '{field}' must be a {expected}, got {actual}")]
    WrongType {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("field '{field}' must be one of {allowed:?}")]
    NotInEnum { field: String, allowed: Vec<String> },
}

/// Validate a model-proposed argument payload against a tool's schema.
///
/// The schema is the JSON Schema subset our tools advertise: an object with
/// `properties` (each carrying a `type` and optional `enum`) and a `required`
/// list. Fields not named in `properties` are ignored.
pub fn validate_arguments(schema: &Value, args: Value) -> Result<Value, ValidationError> {
    let object = args.as_object().ok_or(ValidationError::NotAnObject)?;

    let properties = schema
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for field in required.iter().filter_map(Value::as_str) {
            if !object.contains_key(field) {
                return Err(ValidationError::MissingRequired(field.to_string()));
            }
        }
    }

    for (field, spec) in &properties {
        let Some(value) = object.get(field) else {
            continue;
        };

        if let Some(expected) = spec.get("type").and_then(Value::as_str) {
            if !type_matches(expected, value) {
                return Err(ValidationError::WrongType {
                    field: field.clone(),
                    expected: type_display(expected),
                    actual: json_type_name(value),
                });
            }
        }

        if let Some(allowed) = spec.get("enum").and_then(Value::as_array) {
            if !allowed.contains(value) {
                return Err(ValidationError::NotInEnum {
                    field: field.clone(),
                    allowed: allowed
                        .iter()
                        .map(|v| v.as_str().unwrap_or_default().to_string())
                        .collect(),
                });
            }
        }
    }

    Ok(args)
}

fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        // Unknown declared type: accept rather than reject the whole call.
        _ => true,
    }
}

fn type_display(expected: &str) -> &'static str {
    match expected {
        "string" => "string",
        "number" => "number",
        "integer" => "integer",
        "boolean" => "boolean",
        "object" => "object",
        "array" => "array",
        _ => "value",
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": { "type": "string" },
                "analysis_type": {
                    "type": "string",
                    "enum": ["sentiment", "keywords", "summary"]
                },
                "max_results": { "type": "number" }
            },
            "required": ["text", "analysis_type"]
        })
    }

    #[test]
    fn accepts_conforming_arguments() {
        let args = json!({"text": "hello", "analysis_type": "sentiment"});
        assert!(validate_arguments(&schema(), args).is_ok());
    }

    #[test]
    fn rejects_non_object_payloads() {
        assert_eq!(
            validate_arguments(&schema(), json!("just a string")),
            Err(ValidationError::NotAnObject)
        );
    }

    #[test]
    fn rejects_missing_required_field() {
        let args = json!({"text": "hello"});
        assert_eq!(
            validate_arguments(&schema(), args),
            Err(ValidationError::MissingRequired("analysis_type".to_string()))
        );
    }

    #[test]
    fn rejects_wrong_primitive_type() {
        // Executable text in a numeric slot must fail structurally.
        let args = json!({"text": "hi", "analysis_type": "sentiment", "max_results": "rm -rf /"});
        assert_eq!(
            validate_arguments(&schema(), args),
            Err(ValidationError::WrongType {
                field: "max_results".to_string(),
                expected: "number",
                actual: "string",
            })
        );
    }

    #[test]
    fn rejects_value_outside_enum() {
        let args = json!({"text": "hi", "analysis_type": "emotion"});
        match validate_arguments(&schema(), args) {
            Err(ValidationError::NotInEnum { field, allowed }) => {
                assert_eq!(field, "analysis_type");
                assert_eq!(allowed, vec!["sentiment", "keywords", "summary"]);
            }
            other => panic!("expected enum rejection, got {:?}", other),
        }
    }

    #[test]
    fn ignores_fields_not_in_schema() {
        let args = json!({"text": "hi", "analysis_type": "summary", "extra": 42});
        assert!(validate_arguments(&schema(), args).is_ok());
    }
}
