//! Reconciles model entries with the fields that were asked about.

use serde_json::Value;

use crate::models::field::{FieldDescriptor, SuggestionMap};

/// One model answer after validation. Every member is optional in the wire
/// shape; anything of the wrong JSON type is treated as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Suggestion {
    pub id: Option<String>,
    pub value: Option<String>,
    pub answer: Option<String>,
}

impl Suggestion {
    /// Returns `None` for blank entries (`null`, `false`, `0`, `""`). Any other
    /// non-object entry is an answer with no id and no text.
    pub fn from_entry(entry: &Value) -> Option<Self> {
        if is_blank(entry) {
            return None;
        }
        let Some(object) = entry.as_object() else {
            return Some(Self::default());
        };

        let id = match object.get("id") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        let text = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_string);

        Some(Self {
            id,
            value: text("value"),
            answer: text("answer"),
        })
    }

    /// `value`, else `answer`, else the empty string.
    pub fn into_text(self) -> String {
        self.value.or(self.answer).unwrap_or_default()
    }
}

fn is_blank(entry: &Value) -> bool {
    match entry {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Maps each entry to a field id: its own id, else the id (then name) of the
/// field at the same position. Entries that resolve to no id are dropped.
/// A repeated id keeps the last value.
pub fn normalize_suggestions(entries: &[Value], reference: &[FieldDescriptor]) -> SuggestionMap {
    let mut suggestions = SuggestionMap::new();

    for (index, entry) in entries.iter().enumerate() {
        let Some(suggestion) = Suggestion::from_entry(entry) else {
            continue;
        };

        let target = suggestion
            .id
            .clone()
            .or_else(|| reference.get(index).and_then(|f| f.key()).map(str::to_string));

        if let Some(target) = target {
            suggestions.insert(target, suggestion.into_text());
        }
    }

    suggestions
}
