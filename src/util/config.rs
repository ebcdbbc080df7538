//! Raw configuration access.
//!
//! Plugin settings arrive as an untyped `serde_json::Value` tree. The helpers
//! here classify values, look fields up by exact name and produce
//! path-qualified configuration errors (`settings.refs[2]`,
//! `manifest.template`, ...).
//!
//! Regular expressions have no native JSON form, so they are written as an
//! object holding a single string field: `{ "regex": "\\.js$" }`.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use crate::core::errors::ManifestError;
use crate::util::fs::read_to_string;

/// Field name marking a regular-expression value.
pub const REGEX_FIELD: &str = "regex";

/// Type of a raw configuration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Number,
    Boolean,
    Object,
    Array,
    Regex,
    Missing,
}

impl ValueKind {
    /// Classify an optional value. `null` counts as missing.
    pub fn of(value: Option<&Value>) -> ValueKind {
        match value {
            None | Some(Value::Null) => ValueKind::Missing,
            Some(Value::String(_)) => ValueKind::String,
            Some(Value::Number(_)) => ValueKind::Number,
            Some(Value::Bool(_)) => ValueKind::Boolean,
            Some(Value::Array(_)) => ValueKind::Array,
            Some(v @ Value::Object(_)) => {
                if regex_source(v).is_some() {
                    ValueKind::Regex
                } else {
                    ValueKind::Object
                }
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Boolean => "boolean",
            ValueKind::Object => "object",
            ValueKind::Array => "array",
            ValueKind::Regex => "regex",
            ValueKind::Missing => "missing",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Get the pattern source of a regex value.
pub fn regex_source(value: &Value) -> Option<&str> {
    match value {
        Value::Object(map) if map.len() == 1 => map.get(REGEX_FIELD).and_then(Value::as_str),
        _ => None,
    }
}

/// Dotted/indexed location of a value inside the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPath(String);

impl ConfigPath {
    pub fn root(name: &str) -> Self {
        ConfigPath(name.to_string())
    }

    /// Path of a named field below this one.
    pub fn key(&self, name: &str) -> Self {
        ConfigPath(format!("{}.{}", self.0, name))
    }

    /// Path of an array element below this one.
    pub fn index(&self, index: usize) -> Self {
        ConfigPath(format!("{}[{}]", self.0, index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Load a raw settings file.
///
/// `.json` files are parsed as JSON, anything else as TOML.
pub fn load_settings_file(path: &Path) -> Result<Value> {
    let contents = read_to_string(path)?;

    if path.extension().is_some_and(|ext| ext == "json") {
        return serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse settings: {}", path.display()));
    }

    let value: toml::Value = toml::from_str(&contents)
        .with_context(|| format!("failed to parse settings: {}", path.display()))?;
    serde_json::to_value(value)
        .with_context(|| format!("failed to convert settings: {}", path.display()))
}

/// Check that a value has one of the allowed types.
pub fn check_value<'a>(
    path: &ConfigPath,
    value: Option<&'a Value>,
    allowed: &[ValueKind],
) -> Result<&'a Value, ManifestError> {
    let kind = ValueKind::of(value);
    match value {
        Some(v) if kind != ValueKind::Missing => {
            if allowed.contains(&kind) {
                Ok(v)
            } else {
                Err(wrong_type(path, allowed))
            }
        }
        _ => Err(ManifestError::MissingField {
            path: path.to_string(),
        }),
    }
}

/// Look up a required field by exact name and check its type.
pub fn check<'a>(
    ctx: &ConfigPath,
    obj: &'a Map<String, Value>,
    name: &str,
    allowed: &[ValueKind],
) -> Result<&'a Value, ManifestError> {
    check_value(&ctx.key(name), obj.get(name), allowed)
}

/// Look up an optional field by exact name and check its type if present.
pub fn check_optional<'a>(
    ctx: &ConfigPath,
    obj: &'a Map<String, Value>,
    name: &str,
    allowed: &[ValueKind],
) -> Result<Option<&'a Value>, ManifestError> {
    match obj.get(name) {
        None | Some(Value::Null) => Ok(None),
        value => check_value(&ctx.key(name), value, allowed).map(Some),
    }
}

/// Check that a value is an array whose elements all have allowed types.
pub fn check_array<'a>(
    path: &ConfigPath,
    value: &'a Value,
    allowed: &[ValueKind],
) -> Result<&'a [Value], ManifestError> {
    let Value::Array(items) = value else {
        return Err(ManifestError::WrongType {
            path: path.to_string(),
            expected: format!("array of {}", join_kinds(allowed)),
        });
    };

    for (index, item) in items.iter().enumerate() {
        check_value(&path.index(index), Some(item), allowed)?;
    }

    Ok(items)
}

/// Get a value as a string. Callers check the type first.
pub fn as_string(path: &ConfigPath, value: &Value) -> Result<String, ManifestError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| wrong_type(path, &[ValueKind::String]))
}

fn wrong_type(path: &ConfigPath, allowed: &[ValueKind]) -> ManifestError {
    ManifestError::WrongType {
        path: path.to_string(),
        expected: join_kinds(allowed),
    }
}

fn join_kinds(kinds: &[ValueKind]) -> String {
    kinds
        .iter()
        .map(ValueKind::as_str)
        .collect::<Vec<_>>()
        .join(" or ")
}
