use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use serde::Serialize;
use serde_json::Value;

/// Max length of short text columns.
pub const MAX_TEXT_LEN: usize = 255;

/// A raw, string-typed field value as received from a form or JSON body.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Explicit null (JSON `null`).
    Null,
    Text(String),
}

/// Proposed field changes keyed by the name the client used.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    fields: BTreeMap<String, RawValue>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: RawValue) {
        self.fields.insert(key.into(), value);
    }

    pub fn insert_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.insert(key, RawValue::Text(value.into()));
    }

    /// Flatten a JSON object. Scalars become text so JSON and multipart
    /// bodies go through the same parsing path.
    pub fn from_json(map: serde_json::Map<String, Value>) -> Self {
        let fields = map
            .into_iter()
            .map(|(key, value)| {
                let raw = match value {
                    Value::Null => RawValue::Null,
                    Value::String(s) => RawValue::Text(s),
                    other => RawValue::Text(other.to_string()),
                };
                (key, raw)
            })
            .collect();
        Self { fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// First value present under any of `aliases`.
    pub fn get(&self, aliases: &[&str]) -> Option<&RawValue> {
        aliases.iter().find_map(|key| self.fields.get(*key))
    }

    /// Whether a non-blank value is present under any of `aliases`.
    pub fn has_value(&self, aliases: &[&str]) -> bool {
        matches!(self.get(aliases), Some(RawValue::Text(s)) if !s.trim().is_empty())
    }

    /// Explicit request to clear the image: `remove_image=true`,
    /// `image=null` or `image=""`.
    pub fn removes_image(&self) -> bool {
        let flag = matches!(
            self.get(&["remove_image", "removeImage"]),
            Some(RawValue::Text(s)) if s.eq_ignore_ascii_case("true") || s == "1"
        );
        let cleared = match self.get(&["image"]) {
            Some(RawValue::Null) => true,
            Some(RawValue::Text(s)) => s.is_empty(),
            None => false,
        };
        flag || cleared
    }
}

/// Per-field validation messages keyed by canonical field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    /// Record a message; the first message for a field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.0
    }
}

/// Parse an integer the way form input arrives: `"12"`, `" 12 "` and `"12.0"`
/// are accepted, `"12.5"` and `"abc"` are not.
pub fn parse_int(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

pub fn parse_float(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Reads typed values out of a [`ChangeSet`], collecting errors as it goes.
///
/// Return conventions: `None` leaves the column untouched; for nullable
/// columns `Some(None)` writes NULL.
///
/// NOT NULL columns: explicit null is an error, blank text is ignored and a
/// value that does not parse is an error. Nullable columns: null, blank text
/// and values that do not parse all become NULL; only range violations on
/// parsed values are errors.
pub struct FieldReader<'a> {
    changes: &'a ChangeSet,
    errors: FieldErrors,
}

impl<'a> FieldReader<'a> {
    pub fn new(changes: &'a ChangeSet) -> Self {
        Self {
            changes,
            errors: FieldErrors::default(),
        }
    }

    pub fn required_text(
        &mut self,
        field: &str,
        aliases: &[&str],
        label: &str,
    ) -> Option<String> {
        match self.changes.get(aliases)? {
            RawValue::Null => {
                self.errors.add(field, format!("{label} is required"));
                None
            }
            RawValue::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    None
                } else if s.chars().count() > MAX_TEXT_LEN {
                    self.errors.add(
                        field,
                        format!("{label} must be a string with max {MAX_TEXT_LEN} characters"),
                    );
                    None
                } else {
                    Some(s.to_string())
                }
            }
        }
    }

    pub fn nullable_text(&mut self, aliases: &[&str]) -> Option<Option<String>> {
        match self.changes.get(aliases)? {
            RawValue::Null => Some(None),
            RawValue::Text(s) if s.trim().is_empty() => Some(None),
            RawValue::Text(s) => Some(Some(s.clone())),
        }
    }

    pub fn required_int(
        &mut self,
        field: &str,
        aliases: &[&str],
        label: &str,
        range: RangeInclusive<i64>,
        message: &str,
    ) -> Option<i64> {
        let raw = self.required_raw(field, aliases, label)?;
        match parse_int(raw) {
            Some(v) if range.contains(&v) => Some(v),
            _ => {
                self.errors.add(field, message);
                None
            }
        }
    }

    pub fn nullable_int(
        &mut self,
        field: &str,
        aliases: &[&str],
        range: RangeInclusive<i64>,
        message: &str,
    ) -> Option<Option<i64>> {
        let Some(raw) = self.nullable_raw(aliases)? else {
            return Some(None);
        };
        match parse_int(raw) {
            None => Some(None),
            Some(v) if range.contains(&v) => Some(Some(v)),
            Some(_) => {
                self.errors.add(field, message);
                None
            }
        }
    }

    pub fn required_float(
        &mut self,
        field: &str,
        aliases: &[&str],
        label: &str,
        message: &str,
    ) -> Option<f64> {
        let raw = self.required_raw(field, aliases, label)?;
        match parse_float(raw) {
            Some(v) => Some(v),
            None => {
                self.errors.add(field, message);
                None
            }
        }
    }

    pub fn nullable_float(
        &mut self,
        field: &str,
        aliases: &[&str],
        range: Option<RangeInclusive<f64>>,
        message: &str,
    ) -> Option<Option<f64>> {
        let Some(raw) = self.nullable_raw(aliases)? else {
            return Some(None);
        };
        match parse_float(raw) {
            None => Some(None),
            Some(v) if range.as_ref().is_none_or(|r| r.contains(&v)) => Some(Some(v)),
            Some(_) => {
                self.errors.add(field, message);
                None
            }
        }
    }

    pub fn finish(self) -> Result<(), FieldErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }

    /// Non-blank text of a NOT NULL field, or `None` when there is nothing to apply.
    fn required_raw(&mut self, field: &str, aliases: &[&str], label: &str) -> Option<&'a str> {
        match self.changes.get(aliases)? {
            RawValue::Null => {
                self.errors.add(field, format!("{label} is required"));
                None
            }
            RawValue::Text(s) if s.trim().is_empty() => None,
            RawValue::Text(s) => Some(s.as_str()),
        }
    }

    /// `None` when absent, `Some(None)` when null or blank.
    fn nullable_raw(&self, aliases: &[&str]) -> Option<Option<&'a str>> {
        match self.changes.get(aliases)? {
            RawValue::Null => Some(None),
            RawValue::Text(s) if s.trim().is_empty() => Some(None),
            RawValue::Text(s) => Some(Some(s.as_str())),
        }
    }
}
