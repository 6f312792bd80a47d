use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ProtocolError, Result};

static GAME_ID_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

fn game_id_pattern() -> Option<&'static Regex> {
    GAME_ID_PATTERN
        .get_or_init(|| Regex::new(r"^\d{7}$").ok())
        .as_ref()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Missing,
    InvalidType,
    InvalidValue,
    OutOfRange,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::InvalidType => "invalid_type",
            Self::InvalidValue => "invalid_value",
            Self::OutOfRange => "out_of_range",
        }
    }
}

/// Single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub error_type: ErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.error_type.as_str())?;
        if let Some(expected) = &self.expected {
            write!(f, " (expected {expected}")?;
            if let Some(received) = &self.received {
                write!(f, ", got {received}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// Every field error found in one message; validation never stops early.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<FieldError>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }
}

impl ValidationResult {
    pub fn add_error(&mut self, error: FieldError) {
        self.is_valid = false;
        self.errors.push(error);
    }

    pub fn has_error_for(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn into_result(self, message_type: &str) -> Result<()> {
        if self.is_valid {
            Ok(())
        } else {
            Err(ProtocolError::validation(message_type, self.errors))
        }
    }
}

/// JSON type name used in `invalid_type` errors.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Accepts RFC 3339 timestamps and the naive ISO forms the league emits.
pub fn is_iso_datetime(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

/// Composable field checks that append to a shared [`ValidationResult`].
///
/// Every `require_*` check reports `missing` when the field is absent or
/// null and then applies its own type/range rule; all return the value
/// when it passed so callers can descend into nested structures.
pub struct Checker<'r> {
    result: &'r mut ValidationResult,
    prefix: String,
}

impl<'r> Checker<'r> {
    pub fn new(result: &'r mut ValidationResult) -> Self {
        Self {
            result,
            prefix: String::new(),
        }
    }

    pub fn with_prefix(result: &'r mut ValidationResult, prefix: impl Into<String>) -> Self {
        Self {
            result,
            prefix: prefix.into(),
        }
    }

    /// Checker writing into the same result under an absolute field prefix
    /// such as `payload.scores[0].`.
    pub fn nested(&mut self, prefix: impl Into<String>) -> Checker<'_> {
        Checker {
            result: self.result,
            prefix: prefix.into(),
        }
    }

    /// Checker for a sub-object: `payload.` + `breakdown` gives
    /// `payload.breakdown.`.
    pub fn child(&mut self, field: &str) -> Checker<'_> {
        let prefix = format!("{}{}.", self.prefix, field);
        self.nested(prefix)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn path(&self, field: &str) -> String {
        format!("{}{}", self.prefix, field)
    }

    pub fn error(
        &mut self,
        field: &str,
        kind: ErrorKind,
        expected: Option<String>,
        received: Option<String>,
    ) {
        let path = self.path(field);
        let message = match kind {
            ErrorKind::Missing => Some(format!("'{path}' is required")),
            _ => None,
        };
        self.result.add_error(FieldError {
            field: path,
            error_type: kind,
            expected,
            received,
            message,
        });
    }

    fn invalid_type(&mut self, field: &str, expected: &str, value: &Value) {
        self.error(
            field,
            ErrorKind::InvalidType,
            Some(expected.to_string()),
            Some(json_type_name(value).to_string()),
        );
    }

    pub fn required<'v>(&mut self, obj: &'v Value, field: &str) -> Option<&'v Value> {
        match obj.get(field) {
            None | Some(Value::Null) => {
                self.error(field, ErrorKind::Missing, None, None);
                None
            }
            Some(value) => Some(value),
        }
    }

    /// Present and non-null, without reporting anything otherwise.
    pub fn optional<'v>(&self, obj: &'v Value, field: &str) -> Option<&'v Value> {
        obj.get(field).filter(|v| !v.is_null())
    }

    pub fn non_empty_string<'v>(&mut self, value: &'v Value, field: &str) -> Option<&'v str> {
        match value.as_str() {
            Some(s) if !s.trim().is_empty() => Some(s),
            _ => {
                self.error(
                    field,
                    ErrorKind::InvalidValue,
                    Some("non-empty string".into()),
                    Some(display_value(value)),
                );
                None
            }
        }
    }

    pub fn require_str<'v>(&mut self, obj: &'v Value, field: &str) -> Option<&'v str> {
        let value = self.required(obj, field)?;
        self.non_empty_string(value, field)
    }

    pub fn require_one_of<'v>(
        &mut self,
        obj: &'v Value,
        field: &str,
        choices: &[&str],
    ) -> Option<&'v str> {
        let value = self.required(obj, field)?;
        self.one_of(value, field, choices)
    }

    pub fn one_of<'v>(&mut self, value: &'v Value, field: &str, choices: &[&str]) -> Option<&'v str> {
        match value.as_str() {
            Some(s) if choices.contains(&s) => Some(s),
            _ => {
                self.error(
                    field,
                    ErrorKind::InvalidValue,
                    Some(format!("one of {choices:?}")),
                    Some(display_value(value)),
                );
                None
            }
        }
    }

    pub fn require_positive_int(&mut self, obj: &Value, field: &str) -> Option<u64> {
        let value = self.required(obj, field)?;
        match value.as_u64() {
            Some(n) if n > 0 => Some(n),
            _ => {
                self.error(
                    field,
                    ErrorKind::OutOfRange,
                    Some("positive integer".into()),
                    Some(display_value(value)),
                );
                None
            }
        }
    }

    pub fn require_non_negative_int(&mut self, obj: &Value, field: &str) -> Option<u64> {
        let value = self.required(obj, field)?;
        match value.as_u64() {
            Some(n) => Some(n),
            None => {
                self.error(
                    field,
                    ErrorKind::OutOfRange,
                    Some("non-negative integer".into()),
                    Some(display_value(value)),
                );
                None
            }
        }
    }

    pub fn number_in_range(&mut self, value: &Value, field: &str, min: f64, max: f64) -> Option<f64> {
        let Some(n) = value.as_f64() else {
            self.invalid_type(field, "number", value);
            return None;
        };
        if n < min || n > max {
            self.error(
                field,
                ErrorKind::OutOfRange,
                Some(format!("{min}–{max}")),
                Some(display_value(value)),
            );
            return None;
        }
        Some(n)
    }

    pub fn require_number_in_range(
        &mut self,
        obj: &Value,
        field: &str,
        min: f64,
        max: f64,
    ) -> Option<f64> {
        let value = self.required(obj, field)?;
        self.number_in_range(value, field, min, max)
    }

    pub fn require_bool(&mut self, obj: &Value, field: &str) -> Option<bool> {
        let value = self.required(obj, field)?;
        match value.as_bool() {
            Some(b) => Some(b),
            None => {
                self.invalid_type(field, "boolean", value);
                None
            }
        }
    }

    pub fn iso_datetime(&mut self, value: &Value, field: &str) -> bool {
        match value.as_str() {
            Some(s) if is_iso_datetime(s) => true,
            _ => {
                self.error(
                    field,
                    ErrorKind::InvalidValue,
                    Some("ISO-8601 datetime with timezone".into()),
                    Some(display_value(value)),
                );
                false
            }
        }
    }

    pub fn require_iso_datetime(&mut self, obj: &Value, field: &str) -> bool {
        match self.required(obj, field) {
            Some(value) => self.iso_datetime(value, field),
            None => false,
        }
    }

    pub fn list<'v>(&mut self, value: &'v Value, field: &str, min_len: usize) -> Option<&'v [Value]> {
        let Some(items) = value.as_array() else {
            self.invalid_type(field, "array", value);
            return None;
        };
        if items.len() < min_len {
            self.error(
                field,
                ErrorKind::OutOfRange,
                Some(format!("min length {min_len}")),
                Some(items.len().to_string()),
            );
            return None;
        }
        Some(items)
    }

    pub fn require_list<'v>(
        &mut self,
        obj: &'v Value,
        field: &str,
        min_len: usize,
    ) -> Option<&'v [Value]> {
        let value = self.required(obj, field)?;
        self.list(value, field, min_len)
    }

    pub fn object<'v>(&mut self, value: &'v Value, field: &str) -> Option<&'v Map<String, Value>> {
        match value.as_object() {
            Some(map) => Some(map),
            None => {
                self.invalid_type(field, "object", value);
                None
            }
        }
    }

    pub fn require_object<'v>(
        &mut self,
        obj: &'v Value,
        field: &str,
    ) -> Option<&'v Map<String, Value>> {
        let value = self.required(obj, field)?;
        self.object(value, field)
    }

    pub fn word_count_range(&mut self, text: &str, field: &str, min: usize, max: usize) -> bool {
        let count = word_count(text);
        if count < min || count > max {
            self.error(
                field,
                ErrorKind::OutOfRange,
                Some(format!("{min}–{max} words")),
                Some(format!("{count} words")),
            );
            return false;
        }
        true
    }

    pub fn game_id_format(&mut self, value: &str, field: &str) -> bool {
        if game_id_pattern().is_some_and(|re| re.is_match(value)) {
            return true;
        }
        self.error(
            field,
            ErrorKind::InvalidValue,
            Some("7-digit SSRRGGG format".into()),
            Some(value.to_string()),
        );
        false
    }

    /// Walks `items`, reporting non-object entries and handing each object
    /// to `check` with a `{field}[{i}].` prefix.
    pub fn each_object(
        &mut self,
        items: &[Value],
        field: &str,
        mut check: impl FnMut(&mut Checker<'_>, &Value),
    ) {
        for (i, item) in items.iter().enumerate() {
            let item_path = format!("{}{}[{}]", self.prefix, field, i);
            if !item.is_object() {
                let mut outer = self.nested("");
                outer.invalid_type(&item_path, "object", item);
                continue;
            }
            let mut inner = self.nested(format!("{item_path}."));
            check(&mut inner, item);
        }
    }
}
