//! Output formatting
//!
//! Two renderings of a sanitized record: compact JSON for machine parsing,
//! and the same JSON with each top-level `"key": value` segment wrapped in
//! color for terminal display. Also hosts the process-wide safe stringify
//! used on raw (possibly cyclic) values, and the ANSI stripper.

use colored::Colorize;
use serde_json::{Map as JsonMap, Value};
use std::rc::Rc;

use super::log_level::Level;
use super::sanitize::{scalar_to_json, Visited};
use super::value::LogValue;

/// Compact JSON text of a sanitized record.
pub fn render_plain(record: &JsonMap<String, Value>) -> String {
    serde_json::to_string(record)
        .unwrap_or_else(|_| r#"{"message":"[Object: not serializable]"}"#.to_string())
}

/// Best-effort compact JSON of a raw value, never failing.
///
/// Containers are cycle-guarded by identity; a repeated reference renders as
/// the string `"[Circular]"`. Big integers render as decimal text. Values
/// with no JSON shape fall back to their descriptive placeholders.
pub fn safe_stringify(value: &LogValue) -> String {
    let json = jsonify(value, &mut Visited::new());
    serde_json::to_string(&json).unwrap_or_else(|_| "\"[Object: not serializable]\"".to_string())
}

fn jsonify(value: &LogValue, visited: &mut Visited) -> Value {
    match value {
        LogValue::BigInt(i) => Value::String(i.to_string()),
        LogValue::Array(arr) => {
            if !visited.insert(Rc::as_ptr(arr).cast()) {
                return Value::String("[Circular]".to_string());
            }
            Value::Array(arr.borrow().iter().map(|v| jsonify(v, visited)).collect())
        }
        LogValue::Object(obj) => {
            if !visited.insert(Rc::as_ptr(obj).cast()) {
                return Value::String("[Circular]".to_string());
            }
            let mut map = JsonMap::new();
            for (key, value) in obj.borrow().iter() {
                map.insert(key.clone(), jsonify(value, visited));
            }
            Value::Object(map)
        }
        other => scalar_to_json(other),
    }
}

/// Colorize the compact JSON text of a record for terminal display.
///
/// This is line-oriented text decoration, not a structural re-render: the
/// serialized text is scanned for top-level `"key":value` segments (a segment
/// ends at the next top-level comma or the end of the line, so nested braces
/// and brackets inside values stay intact). Keys get a fixed accent color;
/// values are colored by key role, falling back to a value-shape heuristic.
pub fn format_colored_json(record: &JsonMap<String, Value>, level: Level) -> String {
    let json = render_plain(record);
    let Some(inner) = json
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
    else {
        return json;
    };

    let mut out = String::with_capacity(json.len() * 2);
    out.push('{');
    let mut first = true;
    for segment in split_top_level(inner) {
        if !first {
            out.push(',');
        }
        first = false;
        out.push_str(&colorize_segment(segment, level));
    }
    out.push('}');
    out
}

/// Split the inside of a JSON object on commas that sit outside every string,
/// brace and bracket.
fn split_top_level(inner: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut start = 0usize;

    for (idx, c) in inner.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                segments.push(&inner[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    if !inner.is_empty() {
        segments.push(&inner[start..]);
    }
    segments
}

fn colorize_segment(segment: &str, level: Level) -> String {
    match split_key_value(segment) {
        Some((key_with_colon, key_name, value)) => format!(
            "{}{}",
            key_with_colon.cyan(),
            paint_value(key_name, value, level)
        ),
        None => segment.to_string(),
    }
}

/// Split `"key":value` into the raw key-plus-colon text, the bare key name,
/// and the value text.
fn split_key_value(segment: &str) -> Option<(&str, &str, &str)> {
    let bytes = segment.as_bytes();
    if bytes.first() != Some(&b'"') {
        return None;
    }
    let mut escaped = false;
    let mut close = None;
    for (idx, &b) in bytes.iter().enumerate().skip(1) {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' => escaped = true,
            b'"' => {
                close = Some(idx);
                break;
            }
            _ => {}
        }
    }
    let close = close?;
    if bytes.get(close + 1) != Some(&b':') {
        return None;
    }
    Some((
        &segment[..=close + 1],
        &segment[1..close],
        &segment[close + 2..],
    ))
}

/// Static key-to-color table, with a value-shape heuristic for keys it does
/// not know.
fn paint_value(key: &str, value: &str, level: Level) -> String {
    match key {
        "level" => level.colorize(value),
        "message" => value.green().to_string(),
        "timestamp" => value.magenta().to_string(),
        "requestId" | "flow" => value.bright_green().to_string(),
        "userId" | "method" => value.bright_blue().to_string(),
        "context" => value.bright_cyan().to_string(),
        "duration" => value.yellow().to_string(),
        "event" => value.bright_magenta().to_string(),
        "error" | "exception" => value.red().to_string(),
        "stack" => value.dimmed().to_string(),
        "status" | "elapsed" => value.bright_yellow().to_string(),
        _ => heuristic_value_color(value),
    }
}

/// Boolean and numeric text render yellow, `null` dims, everything else is
/// left undecorated.
fn heuristic_value_color(value: &str) -> String {
    if value == "true" || value == "false" || value.parse::<f64>().is_ok() {
        value.yellow().to_string()
    } else if value == "null" {
        value.dimmed().to_string()
    } else {
        value.to_string()
    }
}

/// Remove every ANSI SGR escape sequence from `text`.
pub fn strip_ansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' && chars.peek() == Some(&'[') {
            chars.next();
            for follower in chars.by_ref() {
                if follower.is_ascii_alphabetic() {
                    break;
                }
            }
            continue;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::ValueMap;
    use serde_json::json;

    fn record(value: Value) -> JsonMap<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_render_plain_is_compact_json() {
        let rec = record(json!({"level": "log", "message": "hi", "count": 2}));
        assert_eq!(
            render_plain(&rec),
            r#"{"level":"log","message":"hi","count":2}"#
        );
    }

    #[test]
    fn test_split_top_level_tolerates_nested_containers() {
        let inner = r#""a":{"x":1,"y":[1,2]},"b":"with, comma","c":3"#;
        let segments = split_top_level(inner);
        assert_eq!(
            segments,
            vec![r#""a":{"x":1,"y":[1,2]}"#, r#""b":"with, comma""#, r#""c":3"#]
        );
    }

    #[test]
    fn test_split_key_value() {
        let (raw, key, value) = split_key_value(r#""message":"hello""#).unwrap();
        assert_eq!(raw, r#""message":"#);
        assert_eq!(key, "message");
        assert_eq!(value, r#""hello""#);
    }

    #[test]
    fn test_colorized_output_round_trips_through_strip() {
        colored::control::set_override(true);
        let rec = record(json!({
            "level": "error",
            "message": "failed",
            "timestamp": "2024-01-01T00:00:00.000Z",
            "nested": {"a": [1, 2], "b": "x,y"},
            "count": 7,
            "flag": true,
            "missing": null,
        }));

        let colored_line = format_colored_json(&rec, Level::Error);
        let plain_line = render_plain(&rec);

        assert_ne!(colored_line, plain_line);
        let restored: Value = serde_json::from_str(&strip_ansi(&colored_line)).unwrap();
        let direct: Value = serde_json::from_str(&plain_line).unwrap();
        assert_eq!(restored, direct);
    }

    #[test]
    fn test_empty_record_renders_braces() {
        colored::control::set_override(true);
        let rec = JsonMap::new();
        assert_eq!(strip_ansi(&format_colored_json(&rec, Level::Log)), "{}");
    }

    #[test]
    fn test_heuristic_value_color_shapes() {
        colored::control::set_override(true);
        assert!(heuristic_value_color("true").contains("\u{1b}["));
        assert!(heuristic_value_color("42").contains("\u{1b}["));
        assert!(heuristic_value_color("null").contains("\u{1b}["));
        assert_eq!(heuristic_value_color(r#""plain""#), r#""plain""#);
    }

    #[test]
    fn test_safe_stringify_scalars() {
        assert_eq!(safe_stringify(&LogValue::Null), "null");
        assert_eq!(safe_stringify(&LogValue::Bool(true)), "true");
        assert_eq!(safe_stringify(&LogValue::Int(42)), "42");
        assert_eq!(safe_stringify(&LogValue::from("hello")), "\"hello\"");
        assert_eq!(
            safe_stringify(&LogValue::BigInt(123456789012345678901_i128)),
            "\"123456789012345678901\""
        );
    }

    #[test]
    fn test_safe_stringify_cuts_cycles() {
        let obj = std::rc::Rc::new(std::cell::RefCell::new(ValueMap::new()));
        obj.borrow_mut().insert("a", 1_i64);
        obj.borrow_mut()
            .insert("me", LogValue::Object(std::rc::Rc::clone(&obj)));

        let text = safe_stringify(&LogValue::Object(obj));
        assert_eq!(text, r#"{"a":1,"me":"[Circular]"}"#);
    }

    #[test]
    fn test_strip_ansi_removes_sgr_sequences() {
        let decorated = format!("{}{}{}", "\u{1b}[36m", "text", "\u{1b}[0m");
        assert_eq!(strip_ansi(&decorated), "text");
        assert_eq!(strip_ansi("no escapes"), "no escapes");
    }
}
