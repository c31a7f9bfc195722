//! JSON templates: saved field values that can be replayed onto a page.
//!
//! Accepted shapes: `{"fields": [...], "templateName": "..."}`, or a list whose
//! first element has that shape (the page-data export format).

use serde_json::Value;

use crate::models::field::PageCommand;

/// A template after shape normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplatePayload {
    pub template_name: Option<String>,
    pub fields: Vec<Value>,
}

/// One value the template wants written into the page.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateFill {
    pub id: String,
    pub value: String,
}

/// Returns `None` when no `fields` list can be found.
pub fn normalize_template(data: &Value) -> Option<TemplatePayload> {
    let payload = match data {
        Value::Array(items) => items
            .first()
            .filter(|first| first.get("fields").is_some_and(Value::is_array))?,
        Value::Object(_) if data.get("fields").is_some_and(Value::is_array) => data,
        _ => return None,
    };

    Some(TemplatePayload {
        template_name: payload
            .get("templateName")
            .and_then(Value::as_str)
            .map(str::to_string),
        fields: payload
            .get("fields")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
    })
}

impl TemplatePayload {
    /// Entries with a non-empty string `id` and a `value` key. `null` becomes
    /// an empty string; other non-string values are written in JSON form.
    pub fn fills(&self) -> Vec<TemplateFill> {
        self.fields
            .iter()
            .filter_map(|entry| {
                let id = entry.get("id").and_then(Value::as_str).filter(|id| !id.is_empty())?;
                let value = match entry.get("value")? {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                Some(TemplateFill {
                    id: id.to_string(),
                    value,
                })
            })
            .collect()
    }

    pub fn source_name(&self) -> &str {
        self.template_name.as_deref().unwrap_or("unknown")
    }
}

pub fn fill_commands(fills: &[TemplateFill]) -> Vec<PageCommand> {
    fills
        .iter()
        .map(|fill| PageCommand::FillField {
            id: fill.id.clone(),
            value: fill.value.clone(),
        })
        .collect()
}
