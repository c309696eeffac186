//! Record sanitization
//!
//! Walks an assembled record and produces a JSON-safe copy: sensitive keys
//! are masked, nulls are dropped from mappings, long arrays are truncated,
//! exotic values degrade to descriptive placeholder strings, and reference
//! cycles are cut. The error locator shares the same traversal rules and the
//! same visited-set discipline.
//!
//! The visited set is identity-based (container pointer addresses), freshly
//! allocated per top-level call and never persisted. Entries are added and
//! never removed within one pass, so the second encounter of the same
//! reference reports as circular whether it closes a cycle or merely re-shares
//! a branch.

use chrono::SecondsFormat;
use serde_json::{Map as JsonMap, Value};
use std::collections::HashSet;
use std::rc::Rc;

use super::value::{FormData, FormField, LogError, LogValue, ObjectRef, ValueMap};

/// Identity set of container references seen in one pass.
pub type Visited = HashSet<*const ()>;

/// Bounds applied while sanitizing one record.
#[derive(Debug, Clone, Copy)]
pub struct SanitizeOptions<'a> {
    /// Case-insensitive substring tokens; a key matching any token is masked.
    pub mask_fields: &'a [String],
    /// Arrays longer than this are truncated with a trailing marker entry.
    pub max_array_length: usize,
}

const MASKED: &str = "[MASKED]";

/// Sanitize one assembled record into a JSON-ready mapping.
///
/// The record itself is freshly built per logging call; only the values it
/// carries can be shared or cyclic, so the visited set starts empty.
pub fn sanitize_entry(record: &ValueMap, options: &SanitizeOptions<'_>) -> JsonMap<String, Value> {
    let mut visited = Visited::new();
    sanitize_map(record, options, &mut visited)
}

fn sanitize_map(
    map: &ValueMap,
    options: &SanitizeOptions<'_>,
    visited: &mut Visited,
) -> JsonMap<String, Value> {
    let mut cleaned = JsonMap::new();
    for (key, value) in map.iter() {
        if value.is_null() {
            continue;
        }
        if is_sensitive(key, options.mask_fields) {
            // Masking short-circuits: the subtree is never expanded.
            cleaned.insert(key.clone(), Value::String(MASKED.to_string()));
            continue;
        }
        cleaned.insert(key.clone(), sanitize_value(value, options, visited));
    }
    cleaned
}

fn is_sensitive(key: &str, mask_fields: &[String]) -> bool {
    let key = key.to_lowercase();
    mask_fields
        .iter()
        .any(|token| key.contains(&token.to_lowercase()))
}

/// Convert one value into something JSON-encodable. Containers are
/// cycle-guarded and recursed; everything else goes through the scalar table.
fn sanitize_value(value: &LogValue, options: &SanitizeOptions<'_>, visited: &mut Visited) -> Value {
    match value {
        LogValue::Array(arr) => {
            if !visited.insert(Rc::as_ptr(arr).cast()) {
                return circular_marker();
            }
            Value::Array(sanitize_slice(&arr.borrow(), options, visited))
        }
        LogValue::Object(obj) => {
            if !visited.insert(Rc::as_ptr(obj).cast()) {
                return circular_marker();
            }
            Value::Object(sanitize_map(&obj.borrow(), options, visited))
        }
        other => scalar_to_json(other),
    }
}

/// The scalar half of the serializer table. Each input kind has exactly one
/// arm; the first match wins and the order is semantically significant.
/// Containers never reach this function through the sanitizer; when they do
/// (via the raw stringify fallback) they collapse to their placeholder.
pub(crate) fn scalar_to_json(value: &LogValue) -> Value {
    match value {
        LogValue::Null => Value::Null,
        LogValue::Bool(b) => Value::Bool(*b),
        LogValue::Int(i) => Value::Number((*i).into()),
        LogValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        LogValue::BigInt(i) => Value::String(format!("[BigInt: {}]", i)),
        LogValue::String(s) => Value::String(s.clone()),
        LogValue::Date(d) => Value::String(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
        LogValue::Regex(source) => Value::String(format!("[RegExp: {}]", source)),
        LogValue::Function(name) => Value::String(format!(
            "[Function: {}]",
            name.as_deref().unwrap_or("anonymous")
        )),
        LogValue::Symbol(description) => Value::String(format!("[Symbol: {}]", description)),
        LogValue::Bytes(len) => Value::String(format!("[ArrayBuffer: {} bytes]", len)),
        LogValue::Blob { size, mime } => Value::String(format!("[Blob: {} bytes, {}]", size, mime)),
        LogValue::File { name, size, mime } => {
            Value::String(format!("[File: {} ({} bytes, {})]", name, size, mime))
        }
        LogValue::Form(form) => serialize_form(form),
        LogValue::Error(err) => error_to_value(err),
        LogValue::Array(_) | LogValue::Object(_) => {
            Value::String("[Object: not serializable]".to_string())
        }
        LogValue::Opaque(Some(name)) => {
            Value::String(format!("[{}: object not serializable]", name))
        }
        LogValue::Opaque(None) => Value::String("[Object: not serializable]".to_string()),
    }
}

/// Element-wise sanitize with truncation. Masking never applies to array
/// elements themselves; mappings inside the array are sanitized with the full
/// procedure, so their keys are still mask-checked.
fn sanitize_slice(
    items: &[LogValue],
    options: &SanitizeOptions<'_>,
    visited: &mut Visited,
) -> Vec<Value> {
    let bound = options.max_array_length;
    let mut out: Vec<Value> = items
        .iter()
        .take(bound)
        .map(|item| sanitize_value(item, options, visited))
        .collect();
    if items.len() > bound {
        out.push(Value::String(format!(
            "[TRUNCATED: {} more items]",
            items.len() - bound
        )));
    }
    out
}

fn serialize_form(form: &FormData) -> Value {
    let Some(entries) = form.entries() else {
        return Value::String("[FormData: unable to read entries]".to_string());
    };
    let mut fields = JsonMap::new();
    for (name, field) in entries {
        let rendered = match field {
            FormField::Text(text) => Value::String(text.clone()),
            FormField::File { name, size, mime } => {
                Value::String(format!("[File: {} ({} bytes, {})]", name, size, mime))
            }
        };
        fields.insert(name.clone(), rendered);
    }
    let mut wrapper = JsonMap::new();
    wrapper.insert("[FormData]".to_string(), Value::Object(fields));
    Value::Object(wrapper)
}

pub(crate) fn error_to_value(err: &LogError) -> Value {
    let mut map = JsonMap::new();
    map.insert("name".to_string(), Value::String(err.name.clone()));
    map.insert("message".to_string(), Value::String(err.message.clone()));
    if let Some(stack) = err.stack_one_line() {
        map.insert("stack".to_string(), Value::String(stack));
    }
    Value::Object(map)
}

fn circular_marker() -> Value {
    let mut map = JsonMap::new();
    map.insert(
        "[Circular]".to_string(),
        Value::String("circular reference detected".to_string()),
    );
    Value::Object(map)
}

/// Depth-first search for the first error reachable from `obj`.
///
/// Property values are visited in insertion order; arrays are scanned
/// element-wise, returning error elements immediately and recursing into
/// mapping elements (arrays nested directly inside arrays are not descended).
/// This order decides which error wins when several are present.
pub fn find_nested_error(obj: &ObjectRef, visited: &mut Visited) -> Option<Rc<LogError>> {
    if !visited.insert(Rc::as_ptr(obj).cast()) {
        return None;
    }
    let map = obj.borrow();
    for (_key, value) in map.iter() {
        match value {
            LogValue::Error(err) => return Some(Rc::clone(err)),
            LogValue::Object(nested) => {
                if let Some(err) = find_nested_error(nested, visited) {
                    return Some(err);
                }
            }
            LogValue::Array(items) => {
                for item in items.borrow().iter() {
                    match item {
                        LogValue::Error(err) => return Some(Rc::clone(err)),
                        LogValue::Object(nested) => {
                            if let Some(err) = find_nested_error(nested, visited) {
                                return Some(err);
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
    None
}
