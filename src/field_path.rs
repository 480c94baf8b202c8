//! Field paths into decoded JSON
//!
//! A [`FieldPath`] is an ordered list of [`Segment`]s describing how to descend
//! into a JSON document: object keys, array indices, the last array element, or a
//! random array element. Resolution never panics; every mismatch between the path
//! and the payload becomes a [`FieldPathError`] naming the step that failed.
//!
//! Paths can be built programmatically or parsed from a compact text form:
//!
//! ```
//! use query_fetch::field_path::FieldPath;
//! use serde_json::json;
//!
//! let payload = json!({"photos": {"photo": [{"url_m": "X", "title": "T"}]}});
//!
//! let path: FieldPath = "photos.photo[0].title".parse().unwrap();
//! assert_eq!(path.resolve(&payload).unwrap(), json!("T"));
//!
//! let same = FieldPath::new().key("photos").key("photo").index(0).key("title");
//! assert_eq!(path, same);
//! ```
//!
//! Text syntax: keys are separated by `.`; `[n]` selects index `n`, `[-1]` the last
//! element and `[?]` a random element. Keys containing `.`, `[`, `]` or a backquote
//! can be wrapped in backquotes: ``meta.`content.type` ``. Inside a quoted key a
//! doubled backquote stands for a literal one.

use rand::Rng;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One step of a field path
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Object member lookup
    Key(String),
    /// Array element at a fixed index
    Index(usize),
    /// Last array element
    Last,
    /// Uniformly random array element
    Random,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) if key.is_empty() || key.contains(['.', '[', ']', '`']) => {
                write!(f, "`{}`", key.replace('`', "``"))
            }
            Segment::Key(key) => f.write_str(key),
            Segment::Index(i) => write!(f, "[{i}]"),
            Segment::Last => f.write_str("[-1]"),
            Segment::Random => f.write_str("[?]"),
        }
    }
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Segment::Key(key.to_string())
    }
}

impl From<String> for Segment {
    fn from(key: String) -> Self {
        Segment::Key(key)
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Segment::Index(index)
    }
}

/// What went wrong at a failing step
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldPathErrorKind {
    /// The object has no member with this key
    MissingKey,
    /// The value at this step is not the container the segment needs
    TypeMismatch {
        /// Container the segment expected (`object` or `array`)
        expected: &'static str,
        /// JSON type actually found
        found: &'static str,
    },
    /// The array is shorter than the requested index
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Actual array length
        len: usize,
    },
    /// `Last` or `Random` was applied to an empty array
    EmptyArray,
}

impl fmt::Display for FieldPathErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPathErrorKind::MissingKey => f.write_str("missing field"),
            FieldPathErrorKind::TypeMismatch { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            FieldPathErrorKind::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for array of length {len}")
            }
            FieldPathErrorKind::EmptyArray => f.write_str("array is empty"),
        }
    }
}

/// A field path step could not be resolved
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("step {step} ({segment}): {kind}")]
pub struct FieldPathError {
    /// Zero-based position of the failing segment
    pub step: usize,
    /// The failing segment
    pub segment: Segment,
    /// Failure detail
    pub kind: FieldPathErrorKind,
}

impl FieldPathError {
    /// Name of the missing field, when the failure is a missing object key
    pub fn missing_key(&self) -> Option<&str> {
        match (&self.kind, &self.segment) {
            (FieldPathErrorKind::MissingKey, Segment::Key(key)) => Some(key),
            _ => None,
        }
    }
}

/// The path text could not be parsed
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid field path `{path}` at byte {position}: {reason}")]
pub struct ParseFieldPathError {
    /// The full path text
    pub path: String,
    /// Byte offset of the problem
    pub position: usize,
    /// What was wrong
    pub reason: &'static str,
}

/// Ordered descent into a JSON document
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    /// The empty path, which resolves to the whole document
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an object key
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(Segment::Key(key.into()));
        self
    }

    /// Append a fixed array index
    #[must_use]
    pub fn index(mut self, index: usize) -> Self {
        self.segments.push(Segment::Index(index));
        self
    }

    /// Append a last-element selection
    #[must_use]
    pub fn last(mut self) -> Self {
        self.segments.push(Segment::Last);
        self
    }

    /// Append a random-element selection
    #[must_use]
    pub fn random(mut self) -> Self {
        self.segments.push(Segment::Random);
        self
    }

    /// Segments in order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether the path has no segments
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Descend into `value` and return a copy of the target
    pub fn resolve(&self, value: &Value) -> Result<Value, FieldPathError> {
        self.resolve_ref(value).cloned()
    }

    /// Descend into `value` and borrow the target
    pub fn resolve_ref<'a>(&self, value: &'a Value) -> Result<&'a Value, FieldPathError> {
        let mut rng = rand::thread_rng();
        let mut current = value;

        for (step, segment) in self.segments.iter().enumerate() {
            let fail = |kind| FieldPathError {
                step,
                segment: segment.clone(),
                kind,
            };

            current = match segment {
                Segment::Key(key) => {
                    let object = current.as_object().ok_or_else(|| {
                        fail(FieldPathErrorKind::TypeMismatch {
                            expected: "object",
                            found: json_type(current),
                        })
                    })?;
                    object
                        .get(key)
                        .ok_or_else(|| fail(FieldPathErrorKind::MissingKey))?
                }
                Segment::Index(_) | Segment::Last | Segment::Random => {
                    let array = current.as_array().ok_or_else(|| {
                        fail(FieldPathErrorKind::TypeMismatch {
                            expected: "array",
                            found: json_type(current),
                        })
                    })?;
                    let index = match segment {
                        Segment::Index(i) if *i < array.len() => *i,
                        Segment::Index(i) => {
                            return Err(fail(FieldPathErrorKind::IndexOutOfRange {
                                index: *i,
                                len: array.len(),
                            }));
                        }
                        _ if array.is_empty() => return Err(fail(FieldPathErrorKind::EmptyArray)),
                        Segment::Last => array.len() - 1,
                        _ => rng.gen_range(0..array.len()),
                    };
                    &array[index]
                }
            };
        }

        Ok(current)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 && matches!(segment, Segment::Key(_)) {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = ParseFieldPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |position, reason| ParseFieldPathError {
            path: s.to_string(),
            position,
            reason,
        };

        let bytes = s.as_bytes();
        let mut segments = Vec::new();
        let mut pos = 0;
        // a key is required at the start and after every '.'
        let mut expect_key = !s.is_empty() && bytes[0] != b'[';

        while pos < bytes.len() {
            if expect_key {
                if bytes[pos] == b'`' {
                    let mut key = String::new();
                    let mut cursor = pos + 1;
                    loop {
                        let close = s[cursor..]
                            .find('`')
                            .ok_or_else(|| err(pos, "unterminated quoted key"))?;
                        key.push_str(&s[cursor..cursor + close]);
                        cursor += close + 1;
                        // doubled backquote
                        if bytes.get(cursor) == Some(&b'`') {
                            key.push('`');
                            cursor += 1;
                        } else {
                            break;
                        }
                    }
                    segments.push(Segment::Key(key));
                    pos = cursor;
                } else {
                    let end = s[pos..]
                        .find(['.', '['])
                        .map_or(bytes.len(), |offset| pos + offset);
                    if end == pos {
                        return Err(err(pos, "empty key"));
                    }
                    if s[pos..end].contains([']', '`']) {
                        return Err(err(pos, "unexpected character in key"));
                    }
                    segments.push(Segment::Key(s[pos..end].to_string()));
                    pos = end;
                }
                expect_key = false;
                continue;
            }

            match bytes[pos] {
                b'.' => {
                    pos += 1;
                    if pos == bytes.len() {
                        return Err(err(pos, "trailing '.'"));
                    }
                    expect_key = true;
                }
                b'[' => {
                    let close = s[pos..]
                        .find(']')
                        .map(|offset| pos + offset)
                        .ok_or_else(|| err(pos, "unterminated '['"))?;
                    let selector = &s[pos + 1..close];
                    let segment = match selector {
                        "?" => Segment::Random,
                        "-1" => Segment::Last,
                        digits => digits
                            .parse::<usize>()
                            .map(Segment::Index)
                            .map_err(|_| err(pos + 1, "expected index, -1 or ?"))?,
                    };
                    segments.push(segment);
                    pos = close + 1;
                }
                _ => return Err(err(pos, "expected '.' or '['")),
            }
        }

        Ok(Self { segments })
    }
}

impl<S: Into<Segment>> FromIterator<S> for FieldPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<const N: usize> From<[&str; N]> for FieldPath {
    fn from(keys: [&str; N]) -> Self {
        keys.into_iter().collect()
    }
}

impl From<Vec<&str>> for FieldPath {
    fn from(keys: Vec<&str>) -> Self {
        keys.into_iter().collect()
    }
}

impl From<Vec<Segment>> for FieldPath {
    fn from(segments: Vec<Segment>) -> Self {
        Self { segments }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
