use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A form control as reported by the page scanner.
///
/// Empty `id` / `name` strings are treated as absent. The suggestion pipeline
/// only ever reads descriptors; results come back as a separate [`SuggestionMap`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDescriptor {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tag: String,
    pub id: String,
    pub name: String,
    pub label: String,
    pub placeholder: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub ai_filled: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub json_filled: bool,
}

impl FieldDescriptor {
    /// The id when present, otherwise the name.
    pub fn key(&self) -> Option<&str> {
        non_empty(&self.id).or_else(|| non_empty(&self.name))
    }

    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }

    /// True when the control already carries a non-empty value on the page.
    pub fn has_value(&self) -> bool {
        self.value.as_deref().is_some_and(|v| !v.is_empty())
    }

    /// Human-facing name for log lines: name, then id, then label.
    pub fn display_name(&self) -> &str {
        non_empty(&self.name)
            .or_else(|| non_empty(&self.id))
            .unwrap_or(&self.label)
    }
}

/// Field id → suggested value. Ordered so serialized output is stable.
pub type SuggestionMap = BTreeMap<String, String>;

/// Instruction for the page collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PageCommand {
    FillField { id: String, value: String },
    /// Clear every non-button, non-hidden control on the page.
    ResetForms,
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
