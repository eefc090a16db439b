//! Configuration reading and scoped field access.
//!
//! All three configuration sources (car model registry, calibration, viewing
//! zones) are small JSON documents. They are parsed with `serde_json` and then
//! read through [`ConfigObject`], which applies the same decoding rules everywhere:
//!
//! - lookups are scoped to one object, so sibling entries never leak into each other
//! - required keys that are absent fail with [`CalibviewError::MissingField`]
//! - optional numeric keys that are absent (or `null`) read as `0.0`
//! - numbers may also be written as strings; anything unparsable fails with
//!   [`CalibviewError::MalformedNumber`]
//! - unknown keys are ignored

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::{CalibviewError, Result};

/// Reads a whole configuration file into memory.
///
/// Any failure to open or read the file is reported as
/// [`CalibviewError::ConfigNotFound`].
pub fn read_config(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|source| CalibviewError::ConfigNotFound {
        path: path.to_path_buf(),
        source,
    })
}

/// A parsed configuration file.
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    path: PathBuf,
    root: Value,
}

impl ConfigDocument {
    /// Reads and parses the file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = read_config(path)?;
        Self::parse(path, &text)
    }

    /// Parses `text`, attributing errors to `path`.
    pub fn parse(path: impl Into<PathBuf>, text: &str) -> Result<Self> {
        let path = path.into();
        match serde_json::from_str(text) {
            Ok(root) => Ok(Self { path, root }),
            Err(source) => Err(CalibviewError::Json { path, source }),
        }
    }

    /// Returns the path this document was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the top-level object.
    pub fn root(&self) -> Result<ConfigObject<'_>> {
        match &self.root {
            Value::Object(map) => Ok(ConfigObject::new(&self.path, String::new(), map)),
            _ => Err(CalibviewError::UnexpectedType {
                path: self.path.clone(),
                key: "<root>".to_string(),
                expected: "an object",
            }),
        }
    }
}

/// A bounded view of one JSON object inside a [`ConfigDocument`].
///
/// The scope is the dotted key path of the object (for example
/// `Sharan.transformations[1]`) and only feeds error messages.
#[derive(Debug, Clone)]
pub struct ConfigObject<'a> {
    path: &'a Path,
    scope: String,
    map: &'a Map<String, Value>,
}

impl<'a> ConfigObject<'a> {
    fn new(path: &'a Path, scope: String, map: &'a Map<String, Value>) -> Self {
        Self { path, scope, map }
    }

    /// Wraps `value` as an object scoped under `scope`, if it is one.
    pub fn from_value(path: &'a Path, scope: impl Into<String>, value: &'a Value) -> Option<Self> {
        value
            .as_object()
            .map(|map| Self::new(path, scope.into(), map))
    }

    /// Returns the dotted key path of this object.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Returns the file this object belongs to.
    pub fn path(&self) -> &'a Path {
        self.path
    }

    /// Returns true if `key` is present and not `null`.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterates over the keys of this object in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &'a str> {
        self.map.keys().map(String::as_str)
    }

    /// Looks up `key`, treating `null` as absent.
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    /// Looks up a required `key`.
    pub fn field(&self, key: &str) -> Result<&'a Value> {
        self.get(key).ok_or_else(|| self.missing(key))
    }

    /// Returns the required child object at `key`.
    pub fn object(&self, key: &str) -> Result<ConfigObject<'a>> {
        self.optional_object(key)?.ok_or_else(|| self.missing(key))
    }

    /// Returns the child object at `key`, or `None` if the key is absent.
    pub fn optional_object(&self, key: &str) -> Result<Option<ConfigObject<'a>>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(Self::new(self.path, self.qualified(key), map))),
            Some(_) => Err(self.unexpected(key, "an object")),
        }
    }

    /// Returns the required array at `key`.
    pub fn array(&self, key: &str) -> Result<&'a [Value]> {
        match self.field(key)? {
            Value::Array(items) => Ok(items),
            _ => Err(self.unexpected(key, "an array")),
        }
    }

    /// Reads a required string, trimmed of surrounding whitespace.
    pub fn require_str(&self, key: &str) -> Result<&'a str> {
        match self.field(key)? {
            Value::String(s) => Ok(s.trim()),
            _ => Err(self.unexpected(key, "a string")),
        }
    }

    /// Reads a required number.
    pub fn require_number(&self, key: &str) -> Result<f64> {
        let value = self.field(key)?;
        parse_number(value).ok_or_else(|| self.malformed(key, value))
    }

    /// Reads an optional number, defaulting to `0.0` when absent.
    pub fn optional_number(&self, key: &str) -> Result<f64> {
        match self.get(key) {
            None => Ok(0.0),
            Some(value) => parse_number(value).ok_or_else(|| self.malformed(key, value)),
        }
    }

    /// Reads a required numeric array of exactly `expected` values.
    ///
    /// Nested arrays are flattened in row order, so a 4x3 table and a flat
    /// list of 12 numbers decode identically.
    pub fn numbers(&self, key: &str, expected: usize) -> Result<Vec<f64>> {
        let value = self.field(key)?;
        self.numbers_from(key, value, expected)
    }

    /// Decodes `value` (found under `key`) as exactly `expected` numbers.
    pub fn numbers_from(&self, key: &str, value: &Value, expected: usize) -> Result<Vec<f64>> {
        let mut out = Vec::with_capacity(expected);
        flatten_numbers(value, &mut out).map_err(|bad| self.malformed(key, bad))?;
        if out.len() != expected {
            return Err(CalibviewError::MalformedArray {
                path: self.path.to_path_buf(),
                key: self.qualified(key),
                expected,
                actual: out.len(),
            });
        }
        Ok(out)
    }

    /// Reads an optional number, falling back to `default` when absent.
    pub fn number_or(&self, key: &str, default: f64) -> Result<f64> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => parse_number(value).ok_or_else(|| self.malformed(key, value)),
        }
    }

    /// Returns `key` prefixed with this object's scope.
    pub fn qualified(&self, key: &str) -> String {
        if self.scope.is_empty() {
            key.to_string()
        } else {
            format!("{}.{key}", self.scope)
        }
    }

    pub(crate) fn missing(&self, key: &str) -> CalibviewError {
        CalibviewError::MissingField {
            path: self.path.to_path_buf(),
            key: self.qualified(key),
        }
    }

    fn malformed(&self, key: &str, value: &Value) -> CalibviewError {
        CalibviewError::MalformedNumber {
            path: self.path.to_path_buf(),
            key: self.qualified(key),
            value: value.to_string(),
        }
    }

    pub(crate) fn unexpected(&self, key: &str, expected: &'static str) -> CalibviewError {
        CalibviewError::UnexpectedType {
            path: self.path.to_path_buf(),
            key: self.qualified(key),
            expected,
        }
    }
}

/// Converts a JSON value to a number.
///
/// Strings are accepted when, after trimming spaces and dropping stray
/// `[`, `]` and `,` characters, they parse as a float. Non-finite results
/// (`"NaN"`, `"inf"`) are rejected.
pub fn parse_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !matches!(c, '[' | ']' | ','))
                .collect();
            cleaned.trim().parse().ok()
        }
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// Appends every number in `value` to `out`, descending into arrays.
///
/// Returns the first offending value on failure.
fn flatten_numbers<'v>(value: &'v Value, out: &mut Vec<f64>) -> std::result::Result<(), &'v Value> {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten_numbers(item, out)?;
            }
            Ok(())
        }
        other => {
            out.push(parse_number(other).ok_or(other)?);
            Ok(())
        }
    }
}
