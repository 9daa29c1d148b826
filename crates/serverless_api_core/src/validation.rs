use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::errors::ApiError;

pub const REQUIRED_MESSAGE: &str = "This field is required";
pub const INVALID_NUMBER_MESSAGE: &str = "Must be a valid number";
pub const NOT_A_STRING_MESSAGE: &str = "Must be a string";
pub const EMAIL_REQUIRED_MESSAGE: &str = "Email is required";
pub const INVALID_EMAIL_MESSAGE: &str = "Invalid email format";
pub const DEFAULT_MAX_LENGTH: usize = 1000;

/// Outcome of checking a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FieldValidation {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(message.into()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringRules {
    pub required: bool,
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for StringRules {
    fn default() -> Self {
        Self {
            required: false,
            min_length: 0,
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

impl StringRules {
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberRules {
    pub required: bool,
    pub min: f64,
    pub max: f64,
}

impl Default for NumberRules {
    fn default() -> Self {
        Self {
            required: false,
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }
}

impl NumberRules {
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = min;
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = max;
        self
    }
}

/// Checks an optional string against presence and inclusive length bounds.
///
/// Length is counted in Unicode scalar values. An empty optional string is
/// treated like an absent one.
pub fn validate_string(value: Option<&str>, rules: &StringRules) -> FieldValidation {
    if rules.required && value.map_or(true, |text| text.trim().is_empty()) {
        return FieldValidation::invalid(REQUIRED_MESSAGE);
    }

    let Some(text) = value.filter(|text| !text.is_empty()) else {
        return FieldValidation::ok();
    };

    let length = text.chars().count();
    if length < rules.min_length {
        return FieldValidation::invalid(format!("Minimum length is {}", rules.min_length));
    }
    if length > rules.max_length {
        return FieldValidation::invalid(format!("Maximum length is {}", rules.max_length));
    }

    FieldValidation::ok()
}

/// Checks an optional JSON value that must coerce to a finite number.
///
/// Presence means "not missing, not null and not a blank string": `0` and
/// `false` count as present for the required check.
pub fn validate_number(value: Option<&Value>, rules: &NumberRules) -> FieldValidation {
    let Some(value) = value.filter(|value| !is_absent_number(value)) else {
        return if rules.required {
            FieldValidation::invalid(REQUIRED_MESSAGE)
        } else {
            FieldValidation::ok()
        };
    };

    let Some(number) = coerce_number(value) else {
        return FieldValidation::invalid(INVALID_NUMBER_MESSAGE);
    };

    if number < rules.min {
        return FieldValidation::invalid(format!("Minimum value is {}", rules.min));
    }
    if number > rules.max {
        return FieldValidation::invalid(format!("Maximum value is {}", rules.max));
    }

    FieldValidation::ok()
}

/// Numeric coercion used by [`validate_number`].
pub fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64()?,
        Value::Bool(flag) => f64::from(u8::from(*flag)),
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };

    number.is_finite().then_some(number)
}

fn is_absent_number(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    }
}

pub fn validate_email(value: Option<&str>, required: bool) -> FieldValidation {
    if required && value.map_or(true, |text| text.trim().is_empty()) {
        return FieldValidation::invalid(EMAIL_REQUIRED_MESSAGE);
    }

    match value.filter(|text| !text.is_empty()) {
        Some(email) if !email_pattern().is_match(email) => {
            FieldValidation::invalid(INVALID_EMAIL_MESSAGE)
        }
        _ => FieldValidation::ok(),
    }
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern should compile")
    })
}

pub type FieldValidator = Box<dyn Fn(Option<&Value>) -> FieldValidation + Send + Sync>;

/// String validator over a raw JSON field; non-string values are rejected.
pub fn string_field(
    rules: StringRules,
) -> impl Fn(Option<&Value>) -> FieldValidation + Send + Sync + 'static {
    move |value: Option<&Value>| match value {
        None | Some(Value::Null) => validate_string(None, &rules),
        Some(Value::String(text)) => validate_string(Some(text), &rules),
        Some(_) => FieldValidation::invalid(NOT_A_STRING_MESSAGE),
    }
}

pub fn number_field(
    rules: NumberRules,
) -> impl Fn(Option<&Value>) -> FieldValidation + Send + Sync + 'static {
    move |value: Option<&Value>| validate_number(value, &rules)
}

pub fn email_field(
    required: bool,
) -> impl Fn(Option<&Value>) -> FieldValidation + Send + Sync + 'static {
    move |value: Option<&Value>| match value {
        None | Some(Value::Null) => validate_email(None, required),
        Some(Value::String(text)) => validate_email(Some(text), required),
        Some(_) => FieldValidation::invalid(NOT_A_STRING_MESSAGE),
    }
}

/// Per-endpoint list of checked fields. Fields not declared here are never
/// inspected.
#[derive(Default)]
pub struct FieldSchema {
    fields: Vec<(String, FieldValidator)>,
}

impl FieldSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(
        mut self,
        name: impl Into<String>,
        validator: impl Fn(Option<&Value>) -> FieldValidation + Send + Sync + 'static,
    ) -> Self {
        self.fields.push((name.into(), Box::new(validator)));
        self
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Debug for FieldSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSchema")
            .field("fields", &self.field_names().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaValidation {
    pub valid: bool,
    pub errors: BTreeMap<String, String>,
}

impl SchemaValidation {
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.valid {
            Ok(())
        } else {
            Err(ApiError::validation_failed(self.errors))
        }
    }
}

pub fn validate_schema(data: &Value, schema: &FieldSchema) -> SchemaValidation {
    let mut errors = BTreeMap::new();

    for (name, validator) in &schema.fields {
        let result = validator(data.get(name.as_str()));
        if !result.valid {
            let message = result
                .error
                .unwrap_or_else(|| "Invalid value".to_string());
            errors.insert(name.clone(), message);
        }
    }

    SchemaValidation {
        valid: errors.is_empty(),
        errors,
    }
}
