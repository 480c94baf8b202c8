//! Query-string encoding
//!
//! Turns an ordered list of key/value parameters into a URL-safe query string:
//! `?key=value&key=value`. Pair order is preserved exactly, since some APIs are
//! order-sensitive.
//!
//! Keys and values are percent-encoded with the RFC 3986 unreserved set
//! (`A-Z a-z 0-9 - _ . ~`) passing through unchanged. Everything else, including
//! space and the reserved characters `: / ? # [ ] @ ! $ & ' ( ) * + , ; =`, is
//! escaped as `%XX` of its UTF-8 bytes.
//!
//! # Example
//!
//! ```
//! use query_fetch::query::{Query, encode_query, Parameter};
//!
//! let params = vec![Parameter::new("q", "hello world"), Parameter::new("n", 1)];
//! assert_eq!(encode_query(&params).unwrap(), "?q=hello%20world&n=1");
//!
//! let query = Query::new().param("format", "json").param("nojsoncallback", true);
//! assert_eq!(query.encode().unwrap(), "?format=json&nojsoncallback=true");
//! ```

use crate::error::{Error, Result};
use std::borrow::Cow;

/// A single query parameter value before it is rendered to text
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    /// Text, used as-is
    Text(String),
    /// Signed integer, rendered in decimal
    Integer(i64),
    /// Unsigned integer, rendered in decimal
    Unsigned(u64),
    /// Floating point, rendered with `Display`. NaN and infinities are rejected.
    Float(f64),
    /// Boolean, rendered as `true` / `false`
    Bool(bool),
    /// Raw bytes, which must be valid UTF-8
    Bytes(Vec<u8>),
}

impl ParamValue {
    /// Render the value as text
    ///
    /// Returns the reason as `Err` when the value has no text form.
    pub fn to_text(&self) -> std::result::Result<Cow<'_, str>, String> {
        match self {
            ParamValue::Text(s) => Ok(Cow::Borrowed(s)),
            ParamValue::Integer(n) => Ok(Cow::Owned(n.to_string())),
            ParamValue::Unsigned(n) => Ok(Cow::Owned(n.to_string())),
            ParamValue::Float(f) if f.is_finite() => Ok(Cow::Owned(f.to_string())),
            ParamValue::Float(f) => Err(format!("float value {f} is not finite")),
            ParamValue::Bool(b) => Ok(Cow::Borrowed(if *b { "true" } else { "false" })),
            ParamValue::Bytes(bytes) => std::str::from_utf8(bytes)
                .map(Cow::Borrowed)
                .map_err(|e| format!("bytes are not valid UTF-8: {e}")),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        ParamValue::Text(value.clone())
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Integer(i64::from(value))
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Integer(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Unsigned(u64::from(value))
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        ParamValue::Unsigned(value)
    }
}

impl From<usize> for ParamValue {
    fn from(value: usize) -> Self {
        ParamValue::Unsigned(value as u64)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<Vec<u8>> for ParamValue {
    fn from(value: Vec<u8>) -> Self {
        ParamValue::Bytes(value)
    }
}

/// A key/value pair destined for the query string
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    /// Parameter name (must be non-empty)
    pub key: String,
    /// Parameter value
    pub value: ParamValue,
}

impl Parameter {
    /// Create a new parameter
    pub fn new(key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Encode as `key=value`
    fn encode_pair(&self) -> Result<String> {
        if self.key.is_empty() {
            return Err(Error::encoding("", "parameter key must not be empty"));
        }
        let value = self
            .value
            .to_text()
            .map_err(|reason| Error::encoding(&self.key, reason))?;
        Ok(format!(
            "{}={}",
            urlencoding::encode(&self.key),
            urlencoding::encode(&value)
        ))
    }
}

impl<K, V> From<(K, V)> for Parameter
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from((key, value): (K, V)) -> Self {
        Parameter::new(key, value)
    }
}

/// Encode parameters into a query string
///
/// An empty slice yields `""` with no leading `?`. Fails on the first parameter
/// with an empty key or a value that cannot be rendered as text; the error names
/// that key.
pub fn encode_query(params: &[Parameter]) -> Result<String> {
    if params.is_empty() {
        return Ok(String::new());
    }

    let pairs = params
        .iter()
        .map(Parameter::encode_pair)
        .collect::<Result<Vec<_>>>()?;

    Ok(format!("?{}", pairs.join("&")))
}

/// Decode a query string back into key/value pairs
///
/// A leading `?` is optional. Each pair is split on its first `=`; a pair without
/// `=` decodes to an empty value. Empty segments (e.g. `a=1&&b=2`) are skipped.
pub fn decode_query(query: &str) -> Result<Vec<(String, String)>> {
    let query = query.strip_prefix('?').unwrap_or(query);

    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = urlencoding::decode(key)
                .map_err(|e| Error::encoding(key, format!("invalid percent-encoding: {e}")))?;
            let value = urlencoding::decode(value)
                .map_err(|e| Error::encoding(&*key, format!("invalid percent-encoding: {e}")))?;
            Ok((key.into_owned(), value.into_owned()))
        })
        .collect()
}

/// Ordered list of query parameters
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    params: Vec<Parameter>,
}

impl Query {
    /// Create an empty query
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter (chainable)
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.push(Parameter::new(key, value));
        self
    }

    /// Append a parameter in place
    pub fn push(&mut self, param: impl Into<Parameter>) {
        self.params.push(param.into());
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether the query has no parameters
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parameters in insertion order
    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    /// Encode with [`encode_query`]
    pub fn encode(&self) -> Result<String> {
        encode_query(&self.params)
    }
}

impl<P: Into<Parameter>> FromIterator<P> for Query {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Vec<Parameter>> for Query {
    fn from(params: Vec<Parameter>) -> Self {
        Self { params }
    }
}

impl AsRef<[Parameter]> for Query {
    fn as_ref(&self) -> &[Parameter] {
        &self.params
    }
}
