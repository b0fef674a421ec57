//! Recovery of a JSON value from free-form model output.
//!
//! Models wrap JSON in prose, code fences, or leave trailing commas behind.
//! [`extract_json`] tries, in order: a strict parse of the whole text, the
//! contents of the first fenced code block, and the first balanced `{...}` or
//! `[...]` span. The chosen candidate has trailing commas removed and is then
//! parsed strictly. Nothing is guessed: if no candidate parses, extraction fails.

use crate::Error;
use serde_json::Value;

const FENCE: &str = "```";

/// Extract a JSON value from model output.
pub fn extract_json(text: &str) -> Result<Value, Error> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::json_extraction("model output is empty"));
    }

    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    let candidate = fenced_block(trimmed)
        .or_else(|| balanced_span(trimmed))
        .ok_or_else(|| Error::json_extraction("no JSON object or array found in model output"))?;

    let cleaned = strip_trailing_commas(candidate);
    serde_json::from_str(&cleaned)
        .map_err(|e| Error::json_extraction(format!("candidate is not valid JSON: {e}")))
}

/// Inner content of the first complete fenced code block.
///
/// A `json` tag (any case) right after the opening fence is dropped, even when
/// the content follows on the same line. Any other tag is accepted only when
/// it sits alone on the opening line.
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find(FENCE)?;
    let mut rest = &text[open + FENCE.len()..];

    if let Some(after_tag) = strip_json_tag(rest) {
        rest = after_tag;
    } else {
        let tag_end = rest.find('\n').unwrap_or(rest.len());
        let tag = rest[..tag_end].trim();
        if !tag.is_empty() && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            rest = &rest[tag_end..];
        }
    }

    let close = rest.find(FENCE)?;
    Some(rest[..close].trim())
}

/// The text after a leading `json` tag, unless the tag is part of a longer word.
fn strip_json_tag(text: &str) -> Option<&str> {
    const TAG: &str = "json";

    let head = text.get(..TAG.len())?;
    if !head.eq_ignore_ascii_case(TAG) {
        return None;
    }

    let after = &text[TAG.len()..];
    match after.chars().next() {
        Some(c) if c.is_ascii_alphanumeric() || c == '-' || c == '_' => None,
        _ => Some(after),
    }
}

/// The first balanced `{...}` or `[...]` span, ignoring brackets inside strings.
fn balanced_span(text: &str) -> Option<&str> {
    let start = text.find(|c: char| c == '{' || c == '[')?;
    let close = if text[start..].starts_with('{') { '}' } else { ']' };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth -= 1;
                if depth == 0 {
                    // The outermost bracket must close with its own kind.
                    return (ch == close).then(|| &text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Remove commas that directly precede (modulo whitespace) a `}` or `]`.
///
/// Commas inside string literals are left alone.
fn strip_trailing_commas(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            out.push(ch);
            continue;
        }

        match ch {
            '"' => {
                in_string = true;
                out.push(ch);
            }
            ',' => {
                let next = text[offset + 1..].trim_start().chars().next();
                if !matches!(next, Some('}') | Some(']')) {
                    out.push(ch);
                }
            }
            _ => out.push(ch),
        }
    }

    out
}
