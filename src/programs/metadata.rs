use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

/// Fixed trainer type reported for every program; clients cannot set it
pub const TRAINER_TYPE: i64 = 10;

const FLAG_VALUES: [&str; 2] = ["01", "00"];

/// Program metadata attached to a course.
///
/// Wire names follow the external programs registry, hence the odd casing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramMetadata {
    pub trainer_type: i64,
    #[serde(rename = "Type_of_Activity")]
    pub type_of_activity: i64,
    #[serde(rename = "Mandatory")]
    pub mandatory: String,
    #[serde(rename = "Program_ABROVE")]
    pub program_abrove: String,
    #[serde(rename = "Program_code")]
    pub program_code: String,
}

/// Field name to first failing message
#[derive(Debug, Default, Error)]
#[error("invalid program metadata: {field_errors:?}")]
pub struct ValidationErrors {
    field_errors: HashMap<String, String>,
}

impl ValidationErrors {
    pub(crate) fn add(&mut self, field: &str, message: impl Into<String>) {
        self.field_errors.insert(field.to_string(), message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.field_errors.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.field_errors.get(field).map(String::as_str)
    }

    pub fn into_field_errors(self) -> HashMap<String, String> {
        self.field_errors
    }
}

impl ProgramMetadata {
    /// Validate an untrusted JSON payload.
    ///
    /// `trainer_type` in the input is ignored and replaced by [`TRAINER_TYPE`].
    /// String fields are trimmed before the length and value checks.
    pub fn from_value(data: &Value) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let fields = match data {
            Value::Object(fields) => fields,
            Value::Null => {
                errors.add("non_field_errors", "No data provided");
                return Err(errors);
            }
            other => {
                errors.add(
                    "non_field_errors",
                    format!("Invalid data. Expected a dictionary, but got {}.", kind_of(other)),
                );
                return Err(errors);
            }
        };

        let type_of_activity = integer_field(fields, "Type_of_Activity", &mut errors);
        let mandatory = char_field(fields, "Mandatory", 2, &mut errors)
            .and_then(|v| one_of(v, "Mandatory", &mut errors));
        let program_abrove = char_field(fields, "Program_ABROVE", 2, &mut errors)
            .and_then(|v| one_of(v, "Program_ABROVE", &mut errors));
        let program_code = char_field(fields, "Program_code", 64, &mut errors);

        match (type_of_activity, mandatory, program_abrove, program_code) {
            (Some(type_of_activity), Some(mandatory), Some(program_abrove), Some(program_code))
                if errors.is_empty() =>
            {
                Ok(Self {
                    trainer_type: TRAINER_TYPE,
                    type_of_activity,
                    mandatory,
                    program_abrove,
                    program_code,
                })
            }
            _ => Err(errors),
        }
    }

    pub fn to_value(&self) -> Value {
        // Plain struct of scalars; serialization cannot fail
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

fn present<'a>(fields: &'a Map<String, Value>, name: &str, errors: &mut ValidationErrors) -> Option<&'a Value> {
    match fields.get(name) {
        None => {
            errors.add(name, "This field is required.");
            None
        }
        Some(Value::Null) => {
            errors.add(name, "This field may not be null.");
            None
        }
        Some(value) => Some(value),
    }
}

fn integer_field(fields: &Map<String, Value>, name: &str, errors: &mut ValidationErrors) -> Option<i64> {
    let value = present(fields, name, errors)?;
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            // Accept integral floats such as 155.0
            n.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64).map(|f| f as i64)
        }),
        Value::String(s) => strip_zero_fraction(s.trim()).parse::<i64>().ok(),
        _ => None,
    };

    if parsed.is_none() {
        errors.add(name, "A valid integer is required.");
    }
    parsed
}

/// `"155.0"` and `"155."` read as `"155"`
fn strip_zero_fraction(s: &str) -> &str {
    match s.split_once('.') {
        Some((whole, fraction)) if fraction.chars().all(|c| c == '0') => whole,
        _ => s,
    }
}

fn char_field(
    fields: &Map<String, Value>,
    name: &str,
    max_length: usize,
    errors: &mut ValidationErrors,
) -> Option<String> {
    let value = present(fields, name, errors)?;
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => {
            errors.add(name, "Not a valid string.");
            return None;
        }
    };

    if text.is_empty() {
        errors.add(name, "This field may not be blank.");
        return None;
    }
    if text.chars().count() > max_length {
        errors.add(name, format!("Ensure this field has no more than {} characters.", max_length));
        return None;
    }
    Some(text)
}

pub(crate) fn one_of(value: String, name: &str, errors: &mut ValidationErrors) -> Option<String> {
    if FLAG_VALUES.contains(&value.as_str()) {
        Some(value)
    } else {
        errors.add(name, format!("{} must be one of: {}", name, FLAG_VALUES.join(", ")));
        None
    }
}
