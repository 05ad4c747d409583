//! Validation of caller supplied values.
//!
//! API bindings take loosely typed input (query parameters, CLI flags, JSON
//! documents) and need to check it before a request goes out. [`Check`] does
//! the type check, optional string casting, case folding, choice and pattern
//! checks in one pass and returns the normalized value.
//!
//! ```rust
//! use restline_client::check::{Check, ExpectedType};
//! use serde_json::json;
//!
//! let per_page = Check::new("per_page")
//!     .expect(ExpectedType::Int)
//!     .validate(&json!("30"))
//!     .unwrap();
//! assert_eq!(per_page, json!(30));
//! ```

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::error::{Error, ErrorKind, Result};
use crate::utils::text::{force_case, Case};

/// The type a value is expected to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedType {
    Int,
    Float,
    Str,
    Bool,
    List,
    Object,
    /// Epoch seconds or an RFC 3339 string, normalized to RFC 3339 UTC.
    Timestamp,
}

impl fmt::Display for ExpectedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExpectedType::Int => "int",
            ExpectedType::Float => "float",
            ExpectedType::Str => "str",
            ExpectedType::Bool => "bool",
            ExpectedType::List => "list",
            ExpectedType::Object => "object",
            ExpectedType::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

const BUILTIN_PATTERNS: &[(&str, &str)] = &[
    (
        "uuid",
        r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$",
    ),
    ("email", r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+$"),
    ("hex", r"^[a-fA-F0-9]+$"),
    (
        "url",
        r"^(https?://)?([\da-z\.-]+)\.([a-z\.]{2,6})([/\w \.-]*)*/?$",
    ),
    (
        "ipv4",
        r"^([0-9]{1,3}\.){3}[0-9]{1,3}(/([0-9]|[1-2][0-9]|3[0-2]))?$",
    ),
    (
        "ipv6",
        concat!(
            r"(([0-9a-fA-F]{1,4}:){7,7}[0-9a-fA-F]{1,4}|",
            r"([0-9a-fA-F]{1,4}:){1,7}:|([0-9a-fA-F]{1,4}:){1,6}:",
            r"[0-9a-fA-F]{1,4}|([0-9a-fA-F]{1,4}:){1,5}",
            r"(:[0-9a-fA-F]{1,4}){1,2}|([0-9a-fA-F]{1,4}:){1,4}",
            r"(:[0-9a-fA-F]{1,4}){1,3}|([0-9a-fA-F]{1,4}:){1,3}",
            r"(:[0-9a-fA-F]{1,4}){1,4}|([0-9a-fA-F]{1,4}:){1,2}",
            r"(:[0-9a-fA-F]{1,4}){1,5}|[0-9a-fA-F]{1,4}:",
            r"((:[0-9a-fA-F]{1,4}){1,6})|:",
            r"((:[0-9a-fA-F]{1,4}){1,7}|:)|",
            r"fe80:(:[0-9a-fA-F]{0,4}){0,4}%[0-9a-zA-Z]{1,}|::",
            r"(ffff(:0{1,4}){0,1}:){0,1}",
            r"((25[0-5]|(2[0-4]|1{0,1}[0-9]){0,1}[0-9])\.){3,3}",
            r"(25[0-5]|(2[0-4]|1{0,1}[0-9]){0,1}[0-9])|",
            r"([0-9a-fA-F]{1,4}:){1,4}:",
            r"((25[0-5]|(2[0-4]|1{0,1}[0-9]){0,1}[0-9])\.){3,3}",
            r"(25[0-5]|(2[0-4]|1{0,1}[0-9]){0,1}[0-9]))"
        ),
    ),
];

/// A validator for a single named value.
#[derive(Debug, Clone)]
pub struct Check {
    name: String,
    expected: Vec<ExpectedType>,
    items: Option<ExpectedType>,
    softcheck: bool,
    choices: Option<Vec<Value>>,
    case: Option<Case>,
    pattern: Option<String>,
    pattern_map: HashMap<String, String>,
    regex: Option<String>,
    default: Option<Value>,
    allow_none: bool,
}

impl Check {
    /// Start a check for the value called `name`. The name is used in error
    /// messages.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expected: Vec::new(),
            items: None,
            softcheck: true,
            choices: None,
            case: None,
            pattern: None,
            pattern_map: HashMap::new(),
            regex: None,
            default: None,
            allow_none: true,
        }
    }

    /// Expect a single type.
    pub fn expect(mut self, expected: ExpectedType) -> Self {
        self.expected = vec![expected];
        self
    }

    /// Accept any of several types. Strings are only cast when a single type
    /// is expected.
    pub fn expect_any(mut self, expected: &[ExpectedType]) -> Self {
        self.expected = expected.to_vec();
        self
    }

    /// Check every item of a list against this type.
    pub fn items(mut self, expected: ExpectedType) -> Self {
        self.items = Some(expected);
        self
    }

    /// Allow or forbid casting strings to the expected type.
    pub fn softcheck(mut self, softcheck: bool) -> Self {
        self.softcheck = softcheck;
        self
    }

    /// Restrict the value (or each list item) to a set of choices.
    pub fn choices<I, V>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    /// Force the case of string values, choices and the default.
    pub fn case(mut self, case: Case) -> Self {
        self.case = Some(case);
        self
    }

    /// Match string values against a named pattern.
    pub fn pattern(mut self, name: impl Into<String>) -> Self {
        self.pattern = Some(name.into());
        self
    }

    /// Add or replace a named pattern.
    pub fn pattern_map(mut self, name: impl Into<String>, regex: impl Into<String>) -> Self {
        self.pattern_map.insert(name.into(), regex.into());
        self
    }

    /// Match string values against a regular expression. Ignored when a
    /// named pattern is set.
    pub fn regex(mut self, regex: impl Into<String>) -> Self {
        self.regex = Some(regex.into());
        self
    }

    /// Value returned when the input is null.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Whether a null input is acceptable.
    pub fn allow_none(mut self, allow: bool) -> Self {
        self.allow_none = allow;
        self
    }

    /// Validate `value` and return its normalized form.
    pub fn validate(&self, value: &Value) -> Result<Value> {
        let value = self.apply_case(value);
        let choices = self
            .choices
            .as_ref()
            .map(|choices| choices.iter().map(|c| self.apply_case(c)).collect::<Vec<_>>());

        if value.is_null() {
            if !self.allow_none {
                return Err(Error::new(ErrorKind::UnexpectedValue(format!(
                    "{} has no value.",
                    self.name
                ))));
            }
            return Ok(self
                .default
                .as_ref()
                .map(|d| self.apply_case(d))
                .unwrap_or(Value::Null));
        }

        let mut value = self.check_type(&self.expected, &value)?;

        if let Some(items) = self.items {
            let Value::Array(list) = &value else {
                return Err(self.type_error(&value, &items.to_string()));
            };
            value = Value::Array(
                list.iter()
                    .map(|item| self.check_type(&[items], item))
                    .collect::<Result<Vec<_>>>()?,
            );
        }

        if let Some(choices) = choices.filter(|c| !c.is_empty()) {
            for item in normalized(&value) {
                if !choices.contains(item) {
                    let expected = choices.iter().map(display).collect::<Vec<_>>().join(",");
                    return Err(Error::new(ErrorKind::UnexpectedValue(format!(
                        "{} has value of {}.  Expected one of {expected}",
                        self.name,
                        display(item)
                    ))));
                }
            }
        }

        if let Some(pattern) = &self.pattern {
            let regex = self.lookup_pattern(pattern)?;
            self.check_regex(&regex, &value)?;
        } else if let Some(regex) = &self.regex {
            self.check_regex(regex, &value)?;
        }

        Ok(value)
    }

    /// Validate an argument that may have been left out.
    ///
    /// A missing argument takes the default. Without a default it is a
    /// `RequiredParameter` error, unless nulls are allowed.
    pub fn validate_opt(&self, value: Option<&Value>) -> Result<Value> {
        match (value, &self.default) {
            (Some(value), _) => self.validate(value),
            (None, Some(default)) => self.validate(default),
            (None, None) if !self.allow_none => Err(Error::new(ErrorKind::RequiredParameter(
                format!("{} is a required parameter", self.name),
            ))),
            (None, None) => Ok(Value::Null),
        }
    }

    fn apply_case(&self, value: &Value) -> Value {
        match self.case {
            Some(case) => force_case(value, case),
            None => value.clone(),
        }
    }

    fn lookup_pattern(&self, name: &str) -> Result<String> {
        if let Some(regex) = self.pattern_map.get(name) {
            return Ok(regex.clone());
        }
        BUILTIN_PATTERNS
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, regex)| (*regex).to_string())
            .ok_or_else(|| {
                Error::new(ErrorKind::UnknownPattern(format!(
                    "pattern name {name} not found in map"
                )))
            })
    }

    fn check_regex(&self, regex: &str, value: &Value) -> Result<()> {
        let compiled = regex_lite::Regex::new(regex).map_err(|e| {
            Error::with_source(
                ErrorKind::UnexpectedValue(format!("{} pattern {regex} is invalid", self.name)),
                e,
            )
        })?;

        for item in normalized(value) {
            if let Value::String(s) = item {
                if !compiled.is_match(s) {
                    return Err(Error::new(ErrorKind::UnexpectedValue(format!(
                        "{} has value of {s}.  Does not match pattern {regex}",
                        self.name
                    ))));
                }
            }
        }
        Ok(())
    }

    fn check_type(&self, expected: &[ExpectedType], value: &Value) -> Result<Value> {
        if expected.is_empty() {
            return Ok(value.clone());
        }

        for ty in expected {
            if let Some(value) = matches_type(*ty, value) {
                return Ok(value);
            }
        }

        let names = expected.iter().map(ToString::to_string).collect::<Vec<_>>();
        let names = names.join(", ");

        if let ([ty], Value::String(s)) = (expected, value) {
            if *ty == ExpectedType::Timestamp {
                if let Some(ts) = parse_timestamp_str(s) {
                    return Ok(ts);
                }
            } else if self.softcheck {
                if let Some(cast) = cast_str(*ty, s) {
                    return Ok(cast);
                }
            }
        }

        Err(self.type_error(value, &names))
    }

    fn type_error(&self, value: &Value, expected: &str) -> Error {
        Error::new(ErrorKind::TypeMismatch(format!(
            "{} is of type {}.  Expected {expected}",
            self.name,
            type_name(value)
        )))
    }
}

/// Returns the value (converted where needed) if it already has the type.
fn matches_type(expected: ExpectedType, value: &Value) -> Option<Value> {
    match (expected, value) {
        (ExpectedType::Int, Value::Number(n)) if n.is_i64() || n.is_u64() => Some(value.clone()),
        (ExpectedType::Float, Value::Number(n)) => n.as_f64().map(Value::from),
        (ExpectedType::Str, Value::String(_))
        | (ExpectedType::Bool, Value::Bool(_))
        | (ExpectedType::List, Value::Array(_))
        | (ExpectedType::Object, Value::Object(_)) => Some(value.clone()),
        (ExpectedType::Timestamp, Value::Number(n)) => n.as_f64().and_then(timestamp_from_epoch),
        _ => None,
    }
}

fn cast_str(expected: ExpectedType, value: &str) -> Option<Value> {
    match expected {
        ExpectedType::Int => value.trim().parse::<i64>().ok().map(Value::from),
        ExpectedType::Float => value.trim().parse::<f64>().ok().map(Value::from),
        ExpectedType::Bool => match value.to_lowercase().as_str() {
            "true" | "yes" => Some(Value::Bool(true)),
            "false" | "no" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

fn timestamp_from_epoch(seconds: f64) -> Option<Value> {
    if !seconds.is_finite() {
        return None;
    }
    let secs = seconds.floor();
    let nanos = ((seconds - secs) * 1e9).round() as u32;
    let dt = DateTime::<Utc>::from_timestamp(secs as i64, nanos.min(999_999_999))?;
    Some(Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
}

fn parse_timestamp_str(value: &str) -> Option<Value> {
    let dt = DateTime::parse_from_rfc3339(value.trim()).ok()?;
    Some(Value::String(
        dt.with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::AutoSi, true),
    ))
}

fn normalized(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
