//! Declarative per-field validation.
//!
//! A [`Validator`] is a table of fields, each with an ordered list of rules.
//! Every rule of every field runs, so one report carries all failures.
//! Rules are pure functions of the field name and its JSON value.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::error::StorefrontError;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern compiles")
});

/// A single rule: `None` means the value passed.
pub type Rule = Box<dyn Fn(&str, &Value) -> Option<FieldError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    StringValidation,
    MinLengthValidation,
    PositiveNumberValidation,
    IntegerValidation,
    EmailValidation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub error: ErrorKind,
    pub message: String,
}

impl FieldError {
    fn new(error: ErrorKind, message: String) -> Self {
        Self { error, message }
    }
}

// ==================== Rules ====================

pub fn is_string() -> Rule {
    Box::new(|name, value| {
        (!value.is_string()).then(|| {
            FieldError::new(ErrorKind::StringValidation, format!("{} must be a string", name))
        })
    })
}

/// Character count, not bytes. Anything that is not a string fails.
pub fn min_length(min: usize) -> Rule {
    Box::new(move |name, value| {
        let length = value.as_str().map(|s| s.chars().count()).unwrap_or(0);
        (length < min).then(|| {
            FieldError::new(
                ErrorKind::MinLengthValidation,
                format!("{} must be at least {} characters long", name, min),
            )
        })
    })
}

pub fn is_positive_number() -> Rule {
    Box::new(|name, value| {
        let positive = as_number(value).is_some_and(|n| n > 0.0);
        (!positive).then(|| {
            FieldError::new(
                ErrorKind::PositiveNumberValidation,
                format!("{} must be a positive number", name),
            )
        })
    })
}

pub fn is_integer() -> Rule {
    Box::new(|name, value| {
        as_integer(value).is_none().then(|| {
            FieldError::new(ErrorKind::IntegerValidation, format!("{} must be a whole number", name))
        })
    })
}

pub fn matches_email_pattern() -> Rule {
    Box::new(|name, value| {
        let matches = value.as_str().is_some_and(|s| EMAIL_PATTERN.is_match(s));
        (!matches).then(|| {
            FieldError::new(
                ErrorKind::EmailValidation,
                format!("{} must be a valid email address", name),
            )
        })
    })
}

/// JSON number, or a string holding one.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

pub fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

// ==================== Validator ====================

struct FieldSpec {
    name: String,
    value: Value,
    rules: Vec<Rule>,
}

#[derive(Default)]
pub struct Validator {
    fields: Vec<FieldSpec>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &str, value: &Value, rules: Vec<Rule>) -> Self {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            value: value.clone(),
            rules,
        });
        self
    }

    /// Add a field only when the value is present.
    pub fn optional_field(self, name: &str, value: Option<&Value>, rules: Vec<Rule>) -> Self {
        match value {
            Some(value) => self.field(name, value, rules),
            None => self,
        }
    }

    pub fn run(&self) -> ValidationReport {
        let mut errors = BTreeMap::new();
        for spec in &self.fields {
            let failures: Vec<FieldError> = spec
                .rules
                .iter()
                .filter_map(|rule| rule(&spec.name, &spec.value))
                .collect();
            if !failures.is_empty() {
                errors.insert(spec.name.clone(), failures);
            }
        }
        ValidationReport { errors }
    }

    /// Run every rule and fail with the full report if anything is invalid.
    pub fn check(&self) -> Result<(), StorefrontError> {
        let report = self.run();
        if report.is_valid() {
            Ok(())
        } else {
            Err(StorefrontError::ValidationFailed(report))
        }
    }
}

/// Failures per field. Fields that passed are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationReport {
    errors: BTreeMap<String, Vec<FieldError>>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors_for(&self, field: &str) -> &[FieldError] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn invalid_fields(&self) -> Vec<&str> {
        self.errors.keys().map(String::as_str).collect()
    }
}
