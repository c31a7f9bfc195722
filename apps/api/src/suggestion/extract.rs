//! Pulls the JSON payload out of free-form model output.
//!
//! Models wrap JSON in prose and code fences often enough that a malformed
//! reply is a normal outcome. Nothing here returns an error; an unusable reply
//! is an empty entry list.

use serde_json::Value;

use crate::activity::LogSink;

/// Returns the suggestion entries found in `raw`, or an empty list.
///
/// The outermost `{ .. }` span must carry a `fields` list. A reply that opens
/// with `[` before any `{` is read as a bare list instead; lists nested inside
/// an object are never used.
pub fn parse_suggestions(raw: &str, log: &dyn LogSink) -> Vec<Value> {
    if opens_with_list(raw) {
        if let Some(Value::Array(entries)) =
            span(raw, '[', ']').and_then(|s| serde_json::from_str::<Value>(s).ok())
        {
            return entries;
        }
    }

    let object = span(raw, '{', '}').and_then(|s| serde_json::from_str::<Value>(s).ok());
    if let Some(Value::Object(mut map)) = object {
        if let Some(Value::Array(entries)) = map.remove("fields") {
            return entries;
        }
    }

    if span(raw, '{', '}').is_none() {
        log.warn(format!("No JSON found in response: {raw}"));
    } else {
        log.warn(format!("JSON response missing 'fields' array: {raw}"));
    }
    Vec::new()
}

fn opens_with_list(raw: &str) -> bool {
    match (raw.find('['), raw.find('{')) {
        (Some(bracket), Some(brace)) => bracket < brace,
        (Some(_), None) => true,
        _ => false,
    }
}

/// Substring from the first `open` to the last `close`, inclusive.
fn span(raw: &str, open: char, close: char) -> Option<&str> {
    let start = raw.find(open)?;
    let end = raw.rfind(close)?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}
