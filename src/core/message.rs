//! Message normalization and argument extraction
//!
//! The first positional argument of a logging call may be a string, an error,
//! an object, or anything else; the remaining arguments are an open-ended
//! mix of errors, strings and objects. This module turns both into a fixed
//! shape the assembler can consume: a message string, at most one error, and
//! an ordered map of extra fields.

use std::backtrace::Backtrace;
use std::rc::Rc;

use super::format::safe_stringify;
use super::log_level::Level;
use super::sanitize::{find_nested_error, Visited};
use super::value::{LogError, LogValue, ObjectRef, ValueMap};

/// Diagnostic fields attached when the message argument is not a string,
/// an error, or a plain mapping.
#[derive(Debug, Clone)]
pub struct InvalidMessageInfo {
    pub warning: &'static str,
    pub callstack: Option<String>,
    pub original_type: &'static str,
    pub original_message: String,
}

/// Outcome of normalizing the message argument.
#[derive(Debug, Clone, Default)]
pub struct NormalizedMessage {
    pub message: String,
    pub error: Option<Rc<LogError>>,
    pub extra: Option<ObjectRef>,
    pub invalid: Option<InvalidMessageInfo>,
}

/// Classify the message argument.
///
/// Strings pass through verbatim. Errors contribute their message text and
/// travel on as the record error. Plain mappings are searched for a nested
/// error; with or without one, the whole mapping becomes extra fields. Every
/// other kind is reported via the invalid-message diagnostic fields, with a
/// best-effort rendering of the value as the message.
pub fn prepare_message(message: &LogValue) -> NormalizedMessage {
    match message {
        LogValue::String(text) => NormalizedMessage {
            message: text.clone(),
            ..Default::default()
        },
        LogValue::Error(err) => NormalizedMessage {
            message: err.message.clone(),
            error: Some(Rc::clone(err)),
            ..Default::default()
        },
        LogValue::Object(obj) => {
            let found = find_nested_error(obj, &mut Visited::new());
            NormalizedMessage {
                message: found
                    .as_ref()
                    .map(|err| err.message.clone())
                    .unwrap_or_else(|| "Object logged".to_string()),
                error: found,
                extra: Some(Rc::clone(obj)),
                ..Default::default()
            }
        }
        other => {
            let message = if other.is_null() {
                "[null]".to_string()
            } else {
                format!("[OBJECT]: {}", safe_stringify(other))
            };
            NormalizedMessage {
                message,
                invalid: Some(InvalidMessageInfo {
                    warning: "Logger called with non-string message parameter",
                    callstack: call_stack_snippet(),
                    original_type: other.type_name(),
                    original_message: safe_stringify(other),
                }),
                ..Default::default()
            }
        }
    }
}

/// Walk the optional parameters in order, pulling out at most one error and
/// folding everything else into extra fields.
///
/// The last error encountered wins; later keys override earlier ones. A bare
/// string is a synthetic error at the error-like levels and a `context` field
/// otherwise. An object is checked for an error under `err` then `error`
/// (error values always, string values only at error-like levels); the
/// matching key is withheld from the merge. Objects with no such key still
/// get a nested-error search before merging wholesale. Parameters of any
/// other kind are dropped.
pub fn extract_error_and_extra(
    params: &[LogValue],
    level: Level,
) -> (Option<Rc<LogError>>, ValueMap) {
    let mut error: Option<Rc<LogError>> = None;
    let mut extra = ValueMap::new();

    for param in params {
        match param {
            LogValue::Error(err) => error = Some(Rc::clone(err)),
            LogValue::String(text) => {
                if level.is_error_like() {
                    error = Some(Rc::new(LogError::new(text.clone())));
                } else {
                    extra.insert("context", text.clone());
                }
            }
            LogValue::Object(obj) => {
                let map = obj.borrow();
                if let Some((promoted, skipped_key)) = promote_error_key(&map, level) {
                    error = Some(promoted);
                    merge_except(&mut extra, &map, skipped_key);
                } else {
                    if let Some(found) = find_nested_error(obj, &mut Visited::new()) {
                        error = Some(found);
                    }
                    extra.merge_from(&map);
                }
            }
            _ => {}
        }
    }
    (error, extra)
}

/// The `err`/`error` promotion chain, first match wins. Returns the promoted
/// error and the key to withhold from the merge.
fn promote_error_key(map: &ValueMap, level: Level) -> Option<(Rc<LogError>, &'static str)> {
    for key in ["err", "error"] {
        if let Some(LogValue::Error(err)) = map.get(key) {
            return Some((Rc::clone(err), key));
        }
    }
    if level.is_error_like() {
        for key in ["err", "error"] {
            if let Some(LogValue::String(text)) = map.get(key) {
                return Some((Rc::new(LogError::new(text.clone())), key));
            }
        }
    }
    None
}

fn merge_except(extra: &mut ValueMap, map: &ValueMap, skipped_key: &str) {
    for (key, value) in map.iter() {
        if key != skipped_key {
            extra.insert(key.clone(), value.clone());
        }
    }
}

/// A short slice of the current call stack, skipping the capture frames.
fn call_stack_snippet() -> Option<String> {
    let captured = Backtrace::force_capture().to_string();
    let snippet: Vec<&str> = captured.lines().skip(2).take(5).collect();
    if snippet.is_empty() {
        None
    } else {
        Some(snippet.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(pairs: Vec<(&str, LogValue)>) -> LogValue {
        LogValue::object(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    #[test]
    fn test_prepare_string_passes_through() {
        let out = prepare_message(&LogValue::from("User logged in"));
        assert_eq!(out.message, "User logged in");
        assert!(out.error.is_none());
        assert!(out.extra.is_none());
        assert!(out.invalid.is_none());
    }

    #[test]
    fn test_prepare_error_contributes_message_and_error() {
        let out = prepare_message(&LogValue::error(LogError::new("disk full")));
        assert_eq!(out.message, "disk full");
        assert_eq!(out.error.unwrap().message, "disk full");
        assert!(out.invalid.is_none());
    }

    #[test]
    fn test_prepare_object_without_error() {
        let out = prepare_message(&object(vec![("userId", LogValue::from("u-1"))]));
        assert_eq!(out.message, "Object logged");
        assert!(out.error.is_none());
        let extra = out.extra.unwrap();
        assert!(extra.borrow().contains_key("userId"));
    }

    #[test]
    fn test_prepare_object_with_nested_error() {
        let msg = object(vec![
            ("op", LogValue::from("sync")),
            (
                "detail",
                object(vec![("cause", LogValue::error(LogError::new("timeout")))]),
            ),
        ]);
        let out = prepare_message(&msg);
        assert_eq!(out.message, "timeout");
        assert_eq!(out.error.unwrap().message, "timeout");
        assert!(out.extra.is_some());
    }

    #[test]
    fn test_prepare_null_is_invalid() {
        let out = prepare_message(&LogValue::Null);
        assert_eq!(out.message, "[null]");
        let invalid = out.invalid.unwrap();
        assert_eq!(
            invalid.warning,
            "Logger called with non-string message parameter"
        );
        assert_eq!(invalid.original_type, "object");
        assert_eq!(invalid.original_message, "null");
    }

    #[test]
    fn test_prepare_number_is_invalid_with_rendering() {
        let out = prepare_message(&LogValue::Int(42));
        assert_eq!(out.message, "[OBJECT]: 42");
        let invalid = out.invalid.unwrap();
        assert_eq!(invalid.original_type, "number");
        assert_eq!(invalid.original_message, "42");
    }

    #[test]
    fn test_prepare_array_is_invalid() {
        let out = prepare_message(&LogValue::array(vec![
            LogValue::Int(1),
            LogValue::Int(2),
        ]));
        assert_eq!(out.message, "[OBJECT]: [1,2]");
        assert_eq!(out.invalid.unwrap().original_type, "object");
    }

    #[test]
    fn test_extract_error_param() {
        let (error, extra) = extract_error_and_extra(
            &[LogValue::error(LogError::new("boom"))],
            Level::Log,
        );
        assert_eq!(error.unwrap().message, "boom");
        assert!(extra.is_empty());
    }

    #[test]
    fn test_extract_string_becomes_synthetic_error_at_error_levels() {
        let (error, extra) =
            extract_error_and_extra(&[LogValue::from("db unreachable")], Level::Error);
        let error = error.unwrap();
        assert_eq!(error.name, "Error");
        assert_eq!(error.message, "db unreachable");
        assert!(extra.is_empty());
    }

    #[test]
    fn test_extract_string_becomes_context_at_info_levels() {
        let (error, extra) =
            extract_error_and_extra(&[LogValue::from("during retry")], Level::Debug);
        assert!(error.is_none());
        assert!(matches!(extra.get("context"), Some(LogValue::String(s)) if s == "during retry"));
    }

    #[test]
    fn test_extract_err_key_promotes_and_is_withheld() {
        let param = LogValue::object(ValueMap::from_iter([
            ("err".to_string(), LogValue::error(LogError::new("boom"))),
            ("attempt".to_string(), LogValue::Int(3)),
        ]));
        let (error, extra) = extract_error_and_extra(&[param], Level::Log);
        assert_eq!(error.unwrap().message, "boom");
        assert!(!extra.contains_key("err"));
        assert!(matches!(extra.get("attempt"), Some(LogValue::Int(3))));
    }

    #[test]
    fn test_extract_err_key_beats_error_key() {
        let param = LogValue::object(ValueMap::from_iter([
            ("error".to_string(), LogValue::error(LogError::new("second"))),
            ("err".to_string(), LogValue::error(LogError::new("first"))),
        ]));
        let (error, extra) = extract_error_and_extra(&[param], Level::Log);
        assert_eq!(error.unwrap().message, "first");
        assert!(!extra.contains_key("err"));
        assert!(extra.contains_key("error"));
    }

    #[test]
    fn test_extract_string_err_key_only_at_error_levels() {
        let make = || {
            LogValue::object(ValueMap::from_iter([
                ("err".to_string(), LogValue::from("socket closed")),
                ("port".to_string(), LogValue::Int(8080)),
            ]))
        };

        let (error, extra) = extract_error_and_extra(&[make()], Level::Warn);
        assert_eq!(error.unwrap().message, "socket closed");
        assert!(!extra.contains_key("err"));

        let (error, extra) = extract_error_and_extra(&[make()], Level::Debug);
        assert!(error.is_none());
        assert!(extra.contains_key("err"));
    }

    #[test]
    fn test_extract_nested_error_is_promoted_but_not_removed() {
        let param = LogValue::object(ValueMap::from_iter([(
            "detail".to_string(),
            LogValue::object(ValueMap::from_iter([(
                "cause".to_string(),
                LogValue::error(LogError::new("timeout")),
            )])),
        )]));
        let (error, extra) = extract_error_and_extra(&[param], Level::Log);
        assert_eq!(error.unwrap().message, "timeout");
        assert!(extra.contains_key("detail"));
    }

    #[test]
    fn test_extract_last_error_wins_and_later_keys_override() {
        let (error, extra) = extract_error_and_extra(
            &[
                LogValue::error(LogError::new("first")),
                LogValue::object(ValueMap::from_iter([(
                    "step".to_string(),
                    LogValue::from("one"),
                )])),
                LogValue::error(LogError::new("second")),
                LogValue::object(ValueMap::from_iter([(
                    "step".to_string(),
                    LogValue::from("two"),
                )])),
            ],
            Level::Log,
        );
        assert_eq!(error.unwrap().message, "second");
        assert!(matches!(extra.get("step"), Some(LogValue::String(s)) if s == "two"));
    }

    #[test]
    fn test_extract_ignores_unclassified_params() {
        let (error, extra) =
            extract_error_and_extra(&[LogValue::Int(1), LogValue::Bool(true)], Level::Log);
        assert!(error.is_none());
        assert!(extra.is_empty());
    }
}
