use super::enums::Priority;
use super::task::{Subtask, Task};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The reusable task shape carried by a template.
///
/// `subtask_names` may be shorter (or longer) than `subtask_count`; when a
/// task is stamped out, exactly `subtask_count` subtasks are generated and
/// missing names fall back to a numbered placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blueprint {
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub subtask_count: usize,
    #[serde(default)]
    pub subtask_names: Vec<String>,
}

impl Blueprint {
    /// Title for the i-th generated subtask (zero-based).
    pub fn subtask_title(&self, index: usize) -> String {
        match self.subtask_names.get(index) {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("Subtask {}", index + 1),
        }
    }
}

/// A pure task specification. Templates are never schedulable or completable
/// themselves; applying one stamps out a fresh task from the blueprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    pub blueprint: Blueprint,
}

impl Template {
    pub fn new(name: impl Into<String>, blueprint: Blueprint) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: Utc::now(),
            blueprint,
        }
    }

    /// Stamp out a new task from this template's blueprint.
    ///
    /// The task takes the template's name as its title, copies priority and
    /// notes, generates exactly `subtask_count` incomplete subtasks, and
    /// records this template as its origin.
    pub fn instantiate(&self, project_id: Option<Uuid>) -> Task {
        let mut task = Task::new(self.name.clone());
        task.project_id = project_id;
        task.priority = self.blueprint.priority;
        if !self.blueprint.notes.is_empty() {
            task.notes = Some(self.blueprint.notes.clone());
        }
        task.subtasks = (0..self.blueprint.subtask_count)
            .map(|i| Subtask::new(self.blueprint.subtask_title(i)))
            .collect();
        task.origin_template_id = Some(self.id);
        task
    }
}

/// Partial update for a template. `name` and each blueprint field merge
/// independently; an absent field never clobbers the existing value.
#[derive(Debug, Clone, Default)]
pub struct TemplatePatch {
    pub name: Option<String>,
    pub priority: Option<Priority>,
    pub notes: Option<String>,
    pub subtask_count: Option<usize>,
    pub subtask_names: Option<Vec<String>>,
}

impl TemplatePatch {
    pub fn apply(self, template: &mut Template) {
        if let Some(name) = self.name {
            template.name = name;
        }
        if let Some(priority) = self.priority {
            template.blueprint.priority = priority;
        }
        if let Some(notes) = self.notes {
            template.blueprint.notes = notes;
        }
        if let Some(subtask_count) = self.subtask_count {
            template.blueprint.subtask_count = subtask_count;
        }
        if let Some(subtask_names) = self.subtask_names {
            template.blueprint.subtask_names = subtask_names;
        }
    }
}
