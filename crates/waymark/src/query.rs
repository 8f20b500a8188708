//! Query-string parsing and serialization.

use std::borrow::Cow;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RouterError};

/// Characters left unescaped by `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// A parsed query value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    /// A key that appeared once.
    Single(String),
    /// A repeated key, or one written with the `key[]` suffix.
    Multi(Vec<String>),
}

impl QueryValue {
    /// Returns the value if it is a single string.
    pub fn as_single(&self) -> Option<&str> {
        match self {
            Self::Single(s) => Some(s),
            Self::Multi(_) => None,
        }
    }

    /// Returns every value in order.
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Single(s) => vec![s.as_str()],
            Self::Multi(v) => v.iter().map(String::as_str).collect(),
        }
    }

    fn push(&mut self, value: String) {
        match self {
            Self::Single(first) => {
                *self = Self::Multi(vec![std::mem::take(first), value]);
            }
            Self::Multi(v) => v.push(value),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

/// Query parameters keyed by decoded name.
pub type QueryMap = BTreeMap<String, QueryValue>;

/// Percent-decodes one URL component.
///
/// A `%` not followed by two hex digits, or escapes that do not form valid
/// UTF-8, are errors rather than being passed through.
pub fn decode_component(input: &str) -> Result<String> {
    let bytes = input.as_bytes();
    let mut pos = 0;
    while let Some(offset) = bytes[pos..].iter().position(|&b| b == b'%') {
        let at = pos + offset;
        let well_formed = bytes
            .get(at + 1..at + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !well_formed {
            return Err(RouterError::Decode {
                input: input.to_string(),
                reason: format!("malformed escape at byte {at}"),
            });
        }
        pos = at + 3;
    }

    percent_decode_str(input)
        .decode_utf8()
        .map(Cow::into_owned)
        .map_err(|e| RouterError::Decode {
            input: input.to_string(),
            reason: e.to_string(),
        })
}

/// Percent-encodes one URL component the way browsers encode URI components.
pub fn encode_component(input: &str) -> String {
    utf8_percent_encode(input, COMPONENT).to_string()
}

/// Parses a query string (with or without its leading `?`).
///
/// `+` is read as a space. A key without `=` gets an empty value. Keys
/// ending in `[]` and keys that repeat collect into [`QueryValue::Multi`].
///
/// # Example
///
/// ```
/// use waymark::{parse_query, QueryValue};
///
/// let query = parse_query("name=John+Doe&tag[]=a&tag[]=b").unwrap();
/// assert_eq!(query["name"], QueryValue::Single("John Doe".into()));
/// assert_eq!(query["tag"].values(), vec!["a", "b"]);
/// ```
pub fn parse_query(input: &str) -> Result<QueryMap> {
    let input = input.strip_prefix('?').unwrap_or(input);
    let input = input.replace('+', " ");
    let mut query = QueryMap::new();

    for pair in input.split('&') {
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        if raw_key.is_empty() {
            continue;
        }

        let value = decode_component(raw_value)?;
        let mut key = decode_component(raw_key)?;
        let list = key.ends_with("[]");
        if list {
            key.truncate(key.len() - 2);
        }

        match query.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(if list {
                    QueryValue::Multi(vec![value])
                } else {
                    QueryValue::Single(value)
                });
            }
            Entry::Occupied(mut slot) => slot.get_mut().push(value),
        }
    }

    Ok(query)
}

/// Serializes a query map without the leading `?`.
///
/// List values are written with the `key[]` suffix so they parse back as
/// lists. [`parse_query`] restores the map for non-empty keys that do not
/// end in `[]`; an empty key is dropped on parsing, and a scalar under a
/// `[]`-suffixed key comes back as a one-element list.
pub fn stringify_query(query: &QueryMap) -> String {
    let mut pairs = Vec::new();
    for (key, value) in query {
        match value {
            QueryValue::Single(v) => pairs.push(format!("{}={}", encode_plus(key), encode_plus(v))),
            QueryValue::Multi(values) => {
                let key = format!("{}[]", encode_plus(key));
                pairs.extend(values.iter().map(|v| format!("{key}={}", encode_plus(v))));
            }
        }
    }
    pairs.join("&")
}

/// Joins a path and a query map into a navigable URL.
pub fn with_query(path: &str, query: &QueryMap) -> String {
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{}", stringify_query(query))
    }
}

fn encode_plus(input: &str) -> String {
    encode_component(input).replace("%20", "+")
}
