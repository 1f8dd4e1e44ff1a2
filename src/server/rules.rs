//! Field rules for the in-process server, with Laravel-style messages.

use crate::framework::FieldErrors;
use serde_json::Value;
use std::collections::BTreeMap;

/// One check applied to a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRule {
    /// Present, not null, not an empty string or array.
    Required,
    String,
    Integer,
    Email,
    /// Minimum length for strings and arrays, minimum value for numbers.
    Min(usize),
    /// Maximum length for strings and arrays, maximum value for numbers.
    Max(usize),
}

/// Rules per field name.
#[derive(Debug, Clone, Default)]
pub struct Rules {
    fields: BTreeMap<String, Vec<FieldRule>>,
}

impl Rules {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, rules: impl IntoIterator<Item = FieldRule>) -> Self {
        self.fields.entry(name.into()).or_default().extend(rules);
        self
    }

    /// Checks `body` against every rule.
    ///
    /// With `partial` set (updates), absent fields are skipped entirely; a field
    /// that is sent must still satisfy its rules.
    pub fn validate(&self, body: &Value, partial: bool) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        for (field, rules) in &self.fields {
            let value = body.get(field);
            if partial && value.is_none() {
                continue;
            }
            let messages = check_field(field, value, rules);
            if !messages.is_empty() {
                errors.insert(field.clone(), messages);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn check_field(field: &str, value: Option<&Value>, rules: &[FieldRule]) -> Vec<String> {
    let label = field.replace('_', " ");
    let Some(value) = value.filter(|v| is_present(v)) else {
        // Rules on a missing optional field do not run.
        return if rules.contains(&FieldRule::Required) {
            vec![format!("The {label} field is required.")]
        } else {
            Vec::new()
        };
    };

    rules
        .iter()
        .filter_map(|rule| check_rule(&label, value, rule))
        .collect()
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

fn check_rule(label: &str, value: &Value, rule: &FieldRule) -> Option<String> {
    match rule {
        FieldRule::Required => None,
        FieldRule::String => {
            (!value.is_string()).then(|| format!("The {label} field must be a string."))
        }
        FieldRule::Integer => {
            (!(value.is_i64() || value.is_u64())).then(|| format!("The {label} field must be an integer."))
        }
        FieldRule::Email => {
            let valid = value.as_str().is_some_and(looks_like_email);
            (!valid).then(|| format!("The {label} field must be a valid email address."))
        }
        FieldRule::Min(min) => match measure(value) {
            Some(Size::Length(len)) if len < *min => {
                Some(format!("The {label} field must be at least {min} characters."))
            }
            Some(Size::Number(n)) if n < *min as f64 => {
                Some(format!("The {label} field must be at least {min}."))
            }
            _ => None,
        },
        FieldRule::Max(max) => match measure(value) {
            Some(Size::Length(len)) if len > *max => {
                Some(format!("The {label} field must not be greater than {max} characters."))
            }
            Some(Size::Number(n)) if n > *max as f64 => {
                Some(format!("The {label} field must not be greater than {max}."))
            }
            _ => None,
        },
    }
}

enum Size {
    Length(usize),
    Number(f64),
}

fn measure(value: &Value) -> Option<Size> {
    match value {
        Value::String(s) => Some(Size::Length(s.chars().count())),
        Value::Array(items) => Some(Size::Length(items.len())),
        Value::Number(n) => n.as_f64().map(Size::Number),
        _ => None,
    }
}

fn looks_like_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() >= 2
                && domain.split('.').all(|part| !part.is_empty())
        }
        None => false,
    }
}
