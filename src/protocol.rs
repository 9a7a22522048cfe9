use crate::error::{Result, VapixError};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt::Display;
use strum_macros::{AsRefStr, EnumString};

/// Ordered list of query-string pairs sent to a CGI endpoint.
///
/// Optional parameters that were not supplied never get a key here; the
/// firmware treats `pan=` differently from a missing `pan`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl ToString) {
        self.pairs.push((key.into(), value.to_string()));
    }

    pub fn push_opt<V: ToString>(&mut self, key: impl Into<String>, value: Option<V>) {
        if let Some(value) = value {
            self.push(key, value);
        }
    }

    /// Insert or overwrite `key`, keeping its original position when present.
    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        let key = key.into();
        let value = value.to_string();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key, value)),
        }
    }

    pub fn extend(&mut self, other: Query) {
        for (key, value) in other.pairs {
            self.set(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// `application/x-www-form-urlencoded` rendering, used for nested values
    /// such as stream profile parameters.
    pub fn to_urlencoded(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }

    /// Flatten a serializable parameter struct into query pairs.
    ///
    /// `None` fields must be skipped by serde and produce no key at all. A
    /// field that still serializes to null (e.g. a NaN float) is an error.
    /// Keys come out in alphabetical order, not field order.
    pub fn from_params<T: Serialize + ?Sized>(params: &T) -> Result<Self> {
        let value = serde_json::to_value(params)
            .map_err(|e| VapixError::SerializationError(e.to_string()))?;

        let Value::Object(map) = value else {
            return Err(VapixError::SerializationError(
                "Command parameters must serialize to a map".to_string(),
            ));
        };

        let mut query = Query::new();
        for (key, value) in map {
            match value {
                Value::Null => {
                    return Err(VapixError::InvalidParameter(format!(
                        "{} has no representable value",
                        key
                    )));
                }
                Value::String(s) => query.push(key, s),
                Value::Number(n) => query.push(key, n),
                Value::Bool(b) => query.push(key, b),
                other => {
                    return Err(VapixError::SerializationError(format!(
                        "Unsupported value for {}: {}",
                        key, other
                    )));
                }
            }
        }
        Ok(query)
    }
}

/// Typed parameters of a single camera operation.
pub trait CommandParams {
    /// Reject out-of-range values before any request is built.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn query(&self) -> Result<Query>;

    fn to_query(&self) -> Result<Query> {
        self.validate()?;
        self.query()
    }
}

pub fn check_range<T: PartialOrd + Display + Copy>(
    name: &str,
    value: Option<T>,
    min: T,
    max: T,
) -> Result<()> {
    // NaN must fail too.
    match value {
        Some(v) if !(v >= min && v <= max) => Err(VapixError::InvalidParameter(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, v
        ))),
        _ => Ok(()),
    }
}

pub fn check_not_empty(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(VapixError::InvalidParameter(format!(
            "{} must not be empty",
            name
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Toggle {
    On,
    Off,
}

impl From<bool> for Toggle {
    fn from(value: bool) -> Self {
        if value { Toggle::On } else { Toggle::Off }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum YesNo {
    Yes,
    No,
}

impl From<bool> for YesNo {
    fn from(value: bool) -> Self {
        if value { YesNo::Yes } else { YesNo::No }
    }
}

/// Serialize `Option<bool>` as the `0`/`1` flags image endpoints expect.
pub(crate) fn serialize_flag<S: Serializer>(
    value: &Option<bool>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(flag) => serializer.serialize_u8(u8::from(*flag)),
        None => serializer.serialize_none(),
    }
}

/// Remove HTML/XML tags, keeping only text content.
pub fn strip_markup(body: &str) -> String {
    let mut text = String::with_capacity(body.len());
    let mut in_tag = false;
    for c in body.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Human-readable error text from a failure body: markup stripped and
/// whitespace collapsed.
pub fn error_text(body: &str) -> String {
    strip_markup(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whitespace-separated `key=value` tokens, in device order.
pub fn parse_tokens(body: &str) -> Result<Vec<(&str, &str)>> {
    body.split_whitespace()
        .map(|token| {
            token.split_once('=').ok_or_else(|| {
                VapixError::UnexpectedResponse(format!("expected key=value, got {:?}", token))
            })
        })
        .collect()
}

/// Line-oriented `key=value` pairs. Lines without `=` (headings, blank
/// lines) are skipped; keys and values are trimmed.
pub fn parse_lines(body: &str) -> impl Iterator<Item = (&str, &str)> {
    body.lines()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim(), value.trim()))
}
