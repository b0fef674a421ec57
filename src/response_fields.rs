//! Type-checked access to fields of untyped backend JSON.
//!
//! Backends return loosely specified documents; every accessor here checks the
//! type of what it finds and yields `None` on a mismatch instead of failing.

use serde_json::Value;

/// String at a JSON pointer (e.g. `/choices/0/message/content`).
pub fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str)
}

/// Non-empty string at a JSON pointer.
pub fn text_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    str_at(value, pointer).filter(|text| !text.is_empty())
}

/// Array at a JSON pointer.
pub fn array_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a [Value]> {
    value
        .pointer(pointer)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
}

/// Best-effort `error.message` lookup shared by all three backends.
pub fn error_message(value: &Value) -> Option<&str> {
    str_at(value, "/error/message")
        .map(str::trim)
        .filter(|message| !message.is_empty())
}

/// Concatenate the `text` field of each element that carries one.
///
/// `only_type` restricts the join to elements whose `type` equals it.
pub fn join_texts(items: &[Value], only_type: Option<&str>) -> String {
    items
        .iter()
        .filter(|item| match only_type {
            Some(wanted) => str_at(item, "/type") == Some(wanted),
            None => true,
        })
        .filter_map(|item| str_at(item, "/text"))
        .collect()
}
