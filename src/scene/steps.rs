use serde::Serialize;

use crate::scene::document::SceneDocument;
use crate::scene::model::Action;

/// Read-only projection of one action for a step list.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StepEntry {
    /// Action id; matches the ids reported by the narration synchronizer.
    pub id: String,
    /// Start time in seconds.
    pub start: f64,
    /// Narration text, or `"<TYPE> object '<objectId>'"` when there is none.
    pub label: String,
}

impl StepEntry {
    pub fn from_action(action: &Action) -> Self {
        let label = match action.narration() {
            Some(text) => text.to_owned(),
            None => format!(
                "{} object '{}'",
                action.kind.type_name().to_uppercase(),
                action.object_id
            ),
        };
        Self {
            id: action.id.clone(),
            start: action.start,
            label,
        }
    }

    /// Start label such as `"1.5s"`.
    pub fn time_label(&self) -> String {
        format!("{}s", self.start)
    }
}

/// All actions as step entries, ordered by `(start, document index)`.
pub fn step_list(doc: &SceneDocument) -> Vec<StepEntry> {
    doc.actions_by_start().map(StepEntry::from_action).collect()
}

/// Playback position as `"<t>s / <duration>s"` with one decimal.
pub fn format_time_display(t: f64, duration: f64) -> String {
    format!("{t:.1}s / {duration:.1}s")
}

#[cfg(test)]
#[path = "../../tests/unit/scene/steps.rs"]
mod tests;
