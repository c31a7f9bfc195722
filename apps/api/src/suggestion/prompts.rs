//! Batch prompt for the suggestion pipeline.

use serde::Serialize;

use crate::models::field::FieldDescriptor;

/// Substituted when the caller supplies no usable context.
pub const NO_CONTEXT: &str = "No resume context was provided.";

/// Batch prompt template. Replace `{context_text}` and `{fields_json}` before sending.
pub const BATCH_PROMPT_TEMPLATE: &str = r#"You are a form filling assistant.

User context pulled from resume context:
{context_text}

You are given the following JSON describing form fields that need values:
{fields_json}

Task:
1. Use the context and field metadata to determine the best value for each field.
2. Respond ONLY with JSON that follows this exact structure:
{
  "fields": [
    { "id": "FIELD_ID", "value": "FINAL VALUE" }
  ]
}
3. Always copy the provided id for each field. If the id is missing, reuse the "name" value.
4. Return empty strings when the answer is truly unknown.
5. Do not include explanations or extra keys.
"#;

/// What the model gets to see of a field. Scraped values never leave the page.
#[derive(Debug, Serialize, PartialEq)]
pub struct PromptField<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub label: &'a str,
    pub placeholder: &'a str,
    #[serde(rename = "type")]
    pub field_type: &'a str,
    pub required: bool,
}

impl<'a> From<&'a FieldDescriptor> for PromptField<'a> {
    fn from(field: &'a FieldDescriptor) -> Self {
        Self {
            id: field.key().unwrap_or_default(),
            name: &field.name,
            label: &field.label,
            placeholder: &field.placeholder,
            field_type: if field.field_type.is_empty() {
                "text"
            } else {
                &field.field_type
            },
            required: field.required,
        }
    }
}

pub fn build_prompt(fields: &[FieldDescriptor], context: &str) -> String {
    let context_text = match context.trim() {
        "" => NO_CONTEXT,
        trimmed => trimmed,
    };

    let projected: Vec<PromptField<'_>> = fields.iter().map(PromptField::from).collect();
    // Serializing borrowed strings and bools cannot fail.
    let fields_json = serde_json::to_string_pretty(&projected).unwrap_or_else(|_| "[]".to_string());

    render(
        BATCH_PROMPT_TEMPLATE,
        &[("{context_text}", context_text), ("{fields_json}", &fields_json)],
    )
}

/// Substitutes placeholders in one pass over `template`. Inserted values are
/// never scanned again, so scraped text that looks like a placeholder stays put.
fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some((at, key, value)) = vars
        .iter()
        .filter_map(|&(key, value)| rest.find(key).map(|at| (at, key, value)))
        .min_by_key(|&(at, _, _)| at)
    {
        out.push_str(&rest[..at]);
        out.push_str(value);
        rest = &rest[at + key.len()..];
    }
    out.push_str(rest);
    out
}
