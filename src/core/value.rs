//! Dynamic log values
//!
//! A logging call accepts data of unknown shape. `LogValue` models every input
//! kind the pipeline can classify as an explicit tagged variant, so that the
//! normalizer, sanitizer and serializer dispatch over a fixed check-chain
//! instead of open-ended reflection. Objects and arrays sit behind `Rc` so the
//! same reference can appear in several places (or form a cycle) and still be
//! recognized by pointer identity.

use chrono::{DateTime, Utc};
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::rc::Rc;

/// Shared handle to an object value.
pub type ObjectRef = Rc<RefCell<ValueMap>>;

/// Shared handle to an array value.
pub type ArrayRef = Rc<RefCell<Vec<LogValue>>>;

/// An ordered `String -> LogValue` mapping with unique keys.
///
/// `insert` on an existing key overwrites the value in place and keeps the
/// key's original position, which is exactly the merge discipline the record
/// pipeline relies on (later sources override earlier ones on key collision
/// without reordering the record).
#[derive(Debug, Clone, Default)]
pub struct ValueMap {
    entries: Vec<(String, LogValue)>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<LogValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&LogValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &LogValue)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Merge `other` on top of `self`: every entry of `other` is inserted,
    /// overriding existing keys in place.
    pub fn merge_from(&mut self, other: &ValueMap) {
        for (key, value) in other.iter() {
            self.insert(key.clone(), value.clone());
        }
    }
}

impl IntoIterator for ValueMap {
    type Item = (String, LogValue);
    type IntoIter = std::vec::IntoIter<(String, LogValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(String, LogValue)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (String, LogValue)>>(iter: I) -> Self {
        let mut map = ValueMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// A runtime failure carried through the log pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogError {
    pub name: String,
    pub message: String,
    pub stack: Option<String>,
}

impl LogError {
    /// Build a synthetic error with name `Error` and a captured backtrace.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            name: "Error".to_string(),
            message: message.into(),
            stack: Some(Backtrace::force_capture().to_string()),
        }
    }

    pub fn with_name(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: Some(Backtrace::force_capture().to_string()),
        }
    }

    /// Replace the captured stack (or remove it with `None`).
    pub fn with_stack(mut self, stack: Option<String>) -> Self {
        self.stack = stack;
        self
    }

    /// The stack with every newline (plus following indentation) collapsed to
    /// a comma, so the record stays a single line.
    pub fn stack_one_line(&self) -> Option<String> {
        self.stack.as_deref().map(collapse_newlines)
    }
}

pub(crate) fn collapse_newlines(text: &str) -> String {
    let mut lines = text.lines();
    let mut out = String::with_capacity(text.len());
    if let Some(first) = lines.next() {
        out.push_str(first);
    }
    for line in lines {
        out.push(',');
        out.push_str(line.trim_start());
    }
    out
}

/// A multipart-form field: plain text or an attached file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormField {
    Text(String),
    File { name: String, size: u64, mime: String },
}

/// Multipart-form data captured for logging.
///
/// A form whose entries could not be read is still representable; it
/// serializes to a fixed placeholder instead of failing the record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    entries: Option<Vec<(String, FormField)>>,
}

impl FormData {
    pub fn new() -> Self {
        Self {
            entries: Some(Vec::new()),
        }
    }

    pub fn unreadable() -> Self {
        Self { entries: None }
    }

    pub fn append(&mut self, name: impl Into<String>, field: FormField) {
        if let Some(entries) = &mut self.entries {
            entries.push((name.into(), field));
        }
    }

    /// `None` when the form could not be read.
    pub fn entries(&self) -> Option<&[(String, FormField)]> {
        self.entries.as_deref()
    }
}

/// Every input kind the pipeline distinguishes, in one tagged variant.
#[derive(Debug, Clone)]
pub enum LogValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Integer beyond double precision; always rendered as decimal text.
    BigInt(i128),
    String(String),
    Date(DateTime<Utc>),
    /// Source-and-flags text of a regular expression.
    Regex(String),
    /// Function with an optional name.
    Function(Option<String>),
    /// Symbol description.
    Symbol(String),
    /// Raw byte buffer, tracked by length only.
    Bytes(usize),
    Blob {
        size: u64,
        mime: String,
    },
    File {
        name: String,
        size: u64,
        mime: String,
    },
    Form(FormData),
    Error(Rc<LogError>),
    Array(ArrayRef),
    Object(ObjectRef),
    /// A value with no JSON representation; carries the constructor name if
    /// one is known.
    Opaque(Option<String>),
}

impl LogValue {
    pub fn object(map: ValueMap) -> Self {
        LogValue::Object(Rc::new(RefCell::new(map)))
    }

    pub fn array(items: Vec<LogValue>) -> Self {
        LogValue::Array(Rc::new(RefCell::new(items)))
    }

    pub fn error(err: LogError) -> Self {
        LogValue::Error(Rc::new(err))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, LogValue::Null)
    }

    /// The host-style type partition reported by the invalid-message fragment.
    /// Follows the `typeof` convention, including `null` reporting as
    /// `"object"`.
    pub fn type_name(&self) -> &'static str {
        match self {
            LogValue::Bool(_) => "boolean",
            LogValue::Int(_) | LogValue::Float(_) => "number",
            LogValue::BigInt(_) => "bigint",
            LogValue::String(_) => "string",
            LogValue::Function(_) => "function",
            LogValue::Symbol(_) => "symbol",
            _ => "object",
        }
    }

    /// Pointer identity of a shared container, for visited-set bookkeeping.
    pub(crate) fn ref_id(&self) -> Option<*const ()> {
        match self {
            LogValue::Object(obj) => Some(Rc::as_ptr(obj).cast()),
            LogValue::Array(arr) => Some(Rc::as_ptr(arr).cast()),
            _ => None,
        }
    }
}

impl From<&str> for LogValue {
    fn from(s: &str) -> Self {
        LogValue::String(s.to_string())
    }
}

impl From<String> for LogValue {
    fn from(s: String) -> Self {
        LogValue::String(s)
    }
}

impl From<bool> for LogValue {
    fn from(b: bool) -> Self {
        LogValue::Bool(b)
    }
}

impl From<i32> for LogValue {
    fn from(i: i32) -> Self {
        LogValue::Int(i64::from(i))
    }
}

impl From<i64> for LogValue {
    fn from(i: i64) -> Self {
        LogValue::Int(i)
    }
}

impl From<u32> for LogValue {
    fn from(i: u32) -> Self {
        LogValue::Int(i64::from(i))
    }
}

impl From<f64> for LogValue {
    fn from(f: f64) -> Self {
        LogValue::Float(f)
    }
}

impl From<i128> for LogValue {
    fn from(i: i128) -> Self {
        LogValue::BigInt(i)
    }
}

impl From<DateTime<Utc>> for LogValue {
    fn from(d: DateTime<Utc>) -> Self {
        LogValue::Date(d)
    }
}

impl From<LogError> for LogValue {
    fn from(err: LogError) -> Self {
        LogValue::error(err)
    }
}

impl From<Rc<LogError>> for LogValue {
    fn from(err: Rc<LogError>) -> Self {
        LogValue::Error(err)
    }
}

impl From<ValueMap> for LogValue {
    fn from(map: ValueMap) -> Self {
        LogValue::object(map)
    }
}

impl From<Vec<LogValue>> for LogValue {
    fn from(items: Vec<LogValue>) -> Self {
        LogValue::array(items)
    }
}

impl From<serde_json::Value> for LogValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => LogValue::Null,
            serde_json::Value::Bool(b) => LogValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => LogValue::Int(i),
                None => n.as_f64().map(LogValue::Float).unwrap_or(LogValue::Null),
            },
            serde_json::Value::String(s) => LogValue::String(s),
            serde_json::Value::Array(items) => {
                LogValue::array(items.into_iter().map(LogValue::from).collect())
            }
            serde_json::Value::Object(map) => LogValue::object(
                map.into_iter()
                    .map(|(k, v)| (k, LogValue::from(v)))
                    .collect(),
            ),
        }
    }
}
