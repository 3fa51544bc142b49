use crate::domain::Task;
use crate::notifications::Notifier;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// An armed one-shot reminder. The title is captured at arming time so a
/// fire never has to reach back into the store.
#[derive(Debug, Clone)]
struct ArmedReminder {
    fire_at: DateTime<Utc>,
    title: String,
}

/// Per-task reminder timers.
///
/// Owns the map from task id to its armed entry; the store calls `sync`
/// after every mutation that could change a task's reminder eligibility and
/// `cancel` when a task is deleted. The composition root drives `fire_due`
/// from its tick loop. All time flows in through explicit `now` arguments,
/// which keeps firing deterministic under test.
pub struct ReminderScheduler {
    armed: HashMap<Uuid, ArmedReminder>,
    notifier: Box<dyn Notifier>,
}

impl ReminderScheduler {
    pub fn new(notifier: Box<dyn Notifier>) -> Self {
        Self {
            armed: HashMap::new(),
            notifier,
        }
    }

    /// Re-derive the armed state for one task.
    ///
    /// Eligible tasks (future reminder, not completed) are armed, replacing
    /// any previous entry for the same id. Ineligible tasks are disarmed:
    /// past-due reminders are silently dropped, never fired late.
    pub fn sync(&mut self, task: &Task, now: DateTime<Utc>) {
        if task.reminder_eligible(now) {
            self.armed.insert(
                task.id,
                ArmedReminder {
                    // reminder_eligible guarantees this is present
                    fire_at: task.reminder_at.unwrap_or(now),
                    title: task.title.clone(),
                },
            );
        } else {
            self.armed.remove(&task.id);
        }
    }

    /// Disarm one task's reminder. Cancelling a non-armed id is a no-op.
    pub fn cancel(&mut self, id: Uuid) {
        self.armed.remove(&id);
    }

    pub fn cancel_all(&mut self) {
        self.armed.clear();
    }

    pub fn is_armed(&self, id: Uuid) -> bool {
        self.armed.contains_key(&id)
    }

    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }

    /// Fire every reminder whose time has come, emitting one notification
    /// per task title. Returns the number fired. Fired entries are removed;
    /// a reminder goes off at most once.
    pub fn fire_due(&mut self, now: DateTime<Utc>) -> usize {
        let due: Vec<Uuid> = self
            .armed
            .iter()
            .filter(|(_, reminder)| reminder.fire_at <= now)
            .map(|(id, _)| *id)
            .collect();

        for id in &due {
            if let Some(reminder) = self.armed.remove(id) {
                self.notifier.notify("Reminder", &reminder.title);
            }
        }

        due.len()
    }
}
