use serde::Serialize;
use std::fmt;

/// Field-scoped validation messages, in the order they were reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.errors
            .iter()
            .filter(move |error| error.field == field)
            .map(|error| error.message.as_str())
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|error| error.field == field)
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    /// `Ok(value)` when nothing was reported.
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }

    /// Records the error of a field check and yields its value.
    pub fn check<T>(&mut self, field: &str, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(message) => {
                self.add(field, message);
                None
            }
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .errors
            .iter()
            .map(|error| format!("{}: {}", error.field, error.message))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&rendered)
    }
}

impl std::error::Error for ValidationErrors {}

pub fn require_text(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("is required".to_string());
    }
    Ok(trimmed.to_string())
}

pub fn parse_non_negative_f64(value: &str) -> Result<f64, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("is required".to_string());
    }
    let parsed = trimmed
        .parse::<f64>()
        .map_err(|_| format!("'{}' is not a number", trimmed))?;
    if !parsed.is_finite() {
        return Err("must be a finite number".to_string());
    }
    if parsed < 0.0 {
        return Err("must not be negative".to_string());
    }
    Ok(parsed)
}

/// Same rule as `parse_non_negative_f64` for values that arrive already typed.
pub fn check_non_negative(value: f64) -> Result<f64, String> {
    if !value.is_finite() {
        return Err("must be a finite number".to_string());
    }
    if value < 0.0 {
        return Err("must not be negative".to_string());
    }
    Ok(value)
}

pub fn parse_positive_u32(value: &str) -> Result<u32, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("is required".to_string());
    }
    if trimmed.starts_with('-') {
        return Err("must not be negative".to_string());
    }
    let parsed = trimmed
        .parse::<u32>()
        .map_err(|_| format!("'{}' is not a whole number", trimmed))?;
    if parsed == 0 {
        return Err("must be greater than zero".to_string());
    }
    Ok(parsed)
}

pub fn parse_non_negative_u32(value: &str) -> Result<u32, String> {
    let trimmed = value.trim();
    if trimmed.starts_with('-') {
        return Err("must not be negative".to_string());
    }
    trimmed
        .parse::<u32>()
        .map_err(|_| format!("'{}' is not a whole number", trimmed))
}

/// Blank means "not set"; anything else must be an integer.
pub fn parse_optional_i64(value: &str) -> Result<Option<i64>, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<i64>()
        .map(Some)
        .map_err(|_| format!("'{}' is not a whole number", trimmed))
}

/// LoRA strengths are signed; only finiteness is enforced here.
pub fn parse_signed_strength(value: &str) -> Result<f32, String> {
    let trimmed = value.trim();
    let parsed = trimmed
        .parse::<f32>()
        .map_err(|_| format!("'{}' is not a number", trimmed))?;
    if !parsed.is_finite() {
        return Err("must be a finite number".to_string());
    }
    Ok(parsed)
}
