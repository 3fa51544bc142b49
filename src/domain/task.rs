use super::enums::Priority;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A checklist entry owned by a single parent task.
/// Subtasks have no lifecycle of their own; they live and die with the task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: Uuid,
    pub title: String,
    pub completed: bool,
}

impl Subtask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            completed: false,
        }
    }
}

/// A single task.
///
/// Timestamps serialize as epoch milliseconds and field names as camelCase;
/// the on-disk and export format both rely on this shape.
/// Invariant: `completed == false` implies `completed_at` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique, stable id assigned at creation
    pub id: Uuid,
    pub title: String,
    pub completed: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Priority,
    /// Owning project; `None` means the task lives in the Inbox
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Uuid>,
    /// Manual sequence position within a project
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<Subtask>,
    /// One-shot reminder time; only actionable while the task is incomplete
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub reminder_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Suggested focus session length in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_mins: Option<u32>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<DateTime<Utc>>,
    /// Template this task was stamped out from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_template_id: Option<Uuid>,
}

impl Task {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            completed: false,
            created_at: Utc::now(),
            due_date: None,
            priority: Priority::default(),
            project_id: None,
            order: None,
            subtasks: Vec::new(),
            reminder_at: None,
            notes: None,
            duration_mins: None,
            completed_at: None,
            origin_template_id: None,
        }
    }

    /// Flip completion, keeping `completed_at` consistent with the new state.
    pub fn toggle(&mut self, now: DateTime<Utc>) {
        self.completed = !self.completed;
        self.completed_at = if self.completed { Some(now) } else { None };
    }

    pub fn add_subtask(&mut self, subtask: Subtask) {
        self.subtasks.push(subtask);
    }

    /// Flip one subtask's completion. Returns false if the subtask is unknown.
    /// Does not touch the parent's own `completed` state, there is no rollup.
    pub fn toggle_subtask(&mut self, subtask_id: Uuid) -> bool {
        match self.subtasks.iter_mut().find(|s| s.id == subtask_id) {
            Some(subtask) => {
                subtask.completed = !subtask.completed;
                true
            }
            None => false,
        }
    }

    /// Whether this task's reminder should currently be armed.
    pub fn reminder_eligible(&self, now: DateTime<Utc>) -> bool {
        match self.reminder_at {
            Some(at) => !self.completed && at > now,
            None => false,
        }
    }
}

/// Partial update for a task.
///
/// Merge rule: a present field overwrites, an absent field is preserved.
/// Fields that are optional on `Task` itself are doubly wrapped so a patch
/// can clear them (`Some(None)`) as well as leave them alone (`None`).
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub completed: Option<bool>,
    pub due_date: Option<Option<NaiveDate>>,
    pub priority: Option<Priority>,
    pub project_id: Option<Option<Uuid>>,
    pub order: Option<Option<u32>>,
    pub reminder_at: Option<Option<DateTime<Utc>>>,
    pub notes: Option<Option<String>>,
    pub duration_mins: Option<Option<u32>>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

impl TaskPatch {
    /// Merge this patch into `task`.
    ///
    /// After merging, `completed_at` is forced to `None` for an incomplete
    /// task so a partial patch can never leave the pair inconsistent.
    pub fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(project_id) = self.project_id {
            task.project_id = project_id;
        }
        if let Some(order) = self.order {
            task.order = order;
        }
        if let Some(reminder_at) = self.reminder_at {
            task.reminder_at = reminder_at;
        }
        if let Some(notes) = self.notes {
            task.notes = notes;
        }
        if let Some(duration_mins) = self.duration_mins {
            task.duration_mins = duration_mins;
        }
        if let Some(completed_at) = self.completed_at {
            task.completed_at = completed_at;
        }
        if !task.completed {
            task.completed_at = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_task_new_defaults() {
        let task = Task::new("Water the plants");
        assert_eq!(task.title, "Water the plants");
        assert!(!task.completed);
        assert_eq!(task.priority, Priority::Med);
        assert!(task.project_id.is_none());
        assert!(task.subtasks.is_empty());
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn test_toggle_twice_restores_state() {
        let mut task = Task::new("Test");
        let now = Utc::now();

        task.toggle(now);
        assert!(task.completed);
        assert_eq!(task.completed_at, Some(now));

        task.toggle(now);
        assert!(!task.completed);
        assert_eq!(task.completed_at, None);
    }

    #[test]
    fn test_toggle_subtask() {
        let mut task = Task::new("Parent");
        let subtask = Subtask::new("Child");
        let id = subtask.id;
        task.add_subtask(subtask);

        assert!(task.toggle_subtask(id));
        assert!(task.subtasks[0].completed);
        // Parent state is untouched
        assert!(!task.completed);

        assert!(!task.toggle_subtask(Uuid::new_v4()));
    }

    #[test]
    fn test_reminder_eligible() {
        let now = Utc::now();
        let mut task = Task::new("Test");
        assert!(!task.reminder_eligible(now));

        task.reminder_at = Some(now + Duration::minutes(10));
        assert!(task.reminder_eligible(now));

        // Past reminders are never eligible
        task.reminder_at = Some(now - Duration::minutes(10));
        assert!(!task.reminder_eligible(now));

        // Completed tasks are never eligible
        task.reminder_at = Some(now + Duration::minutes(10));
        task.completed = true;
        assert!(!task.reminder_eligible(now));
    }

    #[test]
    fn test_patch_merges_present_fields_only() {
        let mut task = Task::new("Original");
        task.notes = Some("keep me".to_string());

        let patch = TaskPatch {
            title: Some("Renamed".to_string()),
            priority: Some(Priority::High),
            ..Default::default()
        };
        patch.apply(&mut task);

        assert_eq!(task.title, "Renamed");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.notes, Some("keep me".to_string()));
    }

    #[test]
    fn test_patch_can_clear_optional_fields() {
        let mut task = Task::new("Test");
        task.project_id = Some(Uuid::new_v4());
        task.notes = Some("gone".to_string());

        let patch = TaskPatch {
            project_id: Some(None),
            notes: Some(None),
            ..Default::default()
        };
        patch.apply(&mut task);

        assert_eq!(task.project_id, None);
        assert_eq!(task.notes, None);
    }

    #[test]
    fn test_patch_enforces_completed_at_invariant() {
        let mut task = Task::new("Test");
        task.toggle(Utc::now());
        assert!(task.completed_at.is_some());

        // Marking incomplete without mentioning completed_at still clears it
        let patch = TaskPatch {
            completed: Some(false),
            ..Default::default()
        };
        patch.apply(&mut task);

        assert!(!task.completed);
        assert_eq!(task.completed_at, None);
    }

    #[test]
    fn test_task_json_shape() {
        let mut task = Task::new("Wire check");
        task.due_date = NaiveDate::from_ymd_opt(2026, 3, 14);

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["title"], "Wire check");
        assert_eq!(json["dueDate"], "2026-03-14");
        assert!(json["createdAt"].is_i64());
        // Absent optionals are omitted entirely
        assert!(json.get("projectId").is_none());
        assert!(json.get("completedAt").is_none());

        let back: Task = serde_json::from_value(json).unwrap();
        assert_eq!(back.id, task.id);
        assert_eq!(back.due_date, task.due_date);
    }
}
