//! Autofill session: decides which scanned fields to ask about, runs the
//! pipeline, and writes usable answers back into the working field set.

use serde::Serialize;

use crate::activity::LogSink;
use crate::models::field::{FieldDescriptor, PageCommand, SuggestionMap};
use crate::suggestion::pipeline::SuggestionEngine;

/// Which fields go to the model, and why the others did not.
#[derive(Debug, Default)]
pub struct FillPlan {
    /// Indices into the working field set.
    pub targets: Vec<usize>,
    pub skipped_existing: usize,
    pub missing_ids: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FillReport {
    pub filled: usize,
    pub skipped_existing: usize,
    pub failed: usize,
    pub missing_ids: usize,
    pub message: String,
}

/// Fields that already hold a value are skipped; fields without an id cannot
/// be written back and are skipped as well.
pub fn plan_fill_targets(fields: &[FieldDescriptor], log: &dyn LogSink) -> FillPlan {
    let mut plan = FillPlan::default();

    for (index, field) in fields.iter().enumerate() {
        if field.has_value() {
            log.info(format!(
                "Skipping field '{}' because it already has a value.",
                field.display_name()
            ));
            plan.skipped_existing += 1;
            continue;
        }
        if !field.has_id() {
            log.warn(format!(
                "Cannot fill field '{}' because it lacks an id attribute.",
                field.display_name()
            ));
            plan.missing_ids += 1;
            continue;
        }
        plan.targets.push(index);
    }

    plan
}

/// Writes non-blank suggestions into the target fields and marks them
/// `ai_filled`. Returns the indices filled in this pass and the failure count.
pub fn apply_suggestions(
    fields: &mut [FieldDescriptor],
    targets: &[usize],
    suggestions: &SuggestionMap,
    log: &dyn LogSink,
) -> (Vec<usize>, usize) {
    let mut filled = Vec::new();
    let mut failed = 0;

    for &index in targets {
        let Some(field) = fields.get_mut(index) else {
            continue;
        };
        match suggestions.get(&field.id) {
            Some(value) if !value.trim().is_empty() => {
                field.value = Some(value.clone());
                field.ai_filled = true;
                filled.push(index);
            }
            _ => {
                log.warn(format!(
                    "AI did not provide a usable value for field '{}'.",
                    field.display_name()
                ));
                failed += 1;
            }
        }
    }

    (filled, failed)
}

fn summarize(plan: &FillPlan, filled: usize, failed: usize) -> String {
    let mut msg = format!("AI generated {filled} values!");
    if plan.skipped_existing > 0 {
        msg.push_str(&format!(" (Skipped {} existing)", plan.skipped_existing));
    }
    if failed > 0 {
        msg.push_str(&format!(" (Failed {failed})"));
    }
    if plan.missing_ids > 0 {
        msg.push_str(&format!(" (Missing IDs {})", plan.missing_ids));
    }
    msg
}

/// Fill commands for the fields at `filled`. Values written by earlier passes
/// are already on the page and are not sent again.
pub fn fill_commands(fields: &[FieldDescriptor], filled: &[usize]) -> Vec<PageCommand> {
    filled
        .iter()
        .filter_map(|&index| fields.get(index))
        .filter(|f| f.ai_filled && f.has_id())
        .filter_map(|f| {
            f.value.as_ref().map(|value| PageCommand::FillField {
                id: f.id.clone(),
                value: value.clone(),
            })
        })
        .collect()
}

/// Runs one autofill pass over `fields` in place. Also returns the indices
/// filled by this pass.
pub async fn autofill(
    engine: &SuggestionEngine,
    fields: &mut [FieldDescriptor],
    context: &str,
    provider: Option<&str>,
) -> (FillReport, Vec<usize>) {
    let log = engine.log();
    let plan = plan_fill_targets(fields, log);

    if plan.targets.is_empty() {
        let mut message = "No empty fields detected that can be filled automatically.".to_string();
        if plan.missing_ids > 0 {
            message.push_str(" Some fields were skipped because they lacked ids.");
        }
        log.warn(message.clone());
        let report = FillReport {
            skipped_existing: plan.skipped_existing,
            missing_ids: plan.missing_ids,
            message,
            ..Default::default()
        };
        return (report, Vec::new());
    }

    let targets: Vec<FieldDescriptor> = plan.targets.iter().map(|&i| fields[i].clone()).collect();
    log.info(format!(
        "Requesting AI suggestions from {} for {} fields.",
        engine.resolve_provider_name(provider),
        targets.len()
    ));
    let suggestions = engine.get_suggested_values(&targets, context, provider).await;

    let (filled_indices, failed) = apply_suggestions(fields, &plan.targets, &suggestions, log);
    let filled = filled_indices.len();
    let mut message = summarize(&plan, filled, failed);

    if filled == 0 && failed > 0 {
        message.push_str(". Check logs for errors.");
        log.error(message.clone());
    } else {
        log.info(message.clone());
    }

    let report = FillReport {
        filled,
        skipped_existing: plan.skipped_existing,
        failed,
        missing_ids: plan.missing_ids,
        message,
    };
    (report, filled_indices)
}
