use crate::domain::{Project, Stats, Subtask, Task, TaskPatch, Template, TemplatePatch};
use crate::persistence::Storage;
use crate::reminder::ReminderScheduler;
use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

/// Options for `remove_template`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveTemplateOptions {
    /// Also delete every task stamped out from this template.
    pub remove_associated_tasks: bool,
}

/// The authoritative in-memory state: tasks, projects, templates and stats.
///
/// All mutations flow through here so that the durable mirror and the
/// reminder scheduler stay consistent with memory. Each operation mutates
/// in-memory state first (re-read-visible before the call returns), then
/// persists the affected collection, then re-derives reminder scheduling for
/// the affected task(s). Persistence is best-effort: a failed write is
/// reported to the caller but in-memory state is already updated, so the
/// session keeps working.
///
/// Mutations targeting an unknown id are silent no-ops; this tolerates races
/// between a deletion and a queued UI action.
pub struct Store {
    pub tasks: Vec<Task>,
    pub projects: Vec<Project>,
    pub templates: Vec<Template>,
    pub stats: Stats,
    /// True once `load()` has installed the persisted collections. Until
    /// then, state-dependent reads are not meaningful.
    pub init_loaded: bool,
    storage: Storage,
    reminders: ReminderScheduler,
}

impl Store {
    pub fn new(storage: Storage, reminders: ReminderScheduler) -> Self {
        Self {
            tasks: Vec::new(),
            projects: Vec::new(),
            templates: Vec::new(),
            stats: Stats::default(),
            init_loaded: false,
            storage,
            reminders,
        }
    }

    /// Install all four persisted collections, then arm reminders for every
    /// loaded task. Loads never fail: a missing or unreadable collection
    /// comes back as its empty default.
    pub fn load(&mut self) {
        self.tasks = self.storage.load_tasks();
        self.projects = self.storage.load_projects();
        self.templates = self.storage.load_templates();
        self.stats = self.storage.load_stats();
        self.init_loaded = true;

        self.schedule_reminders();
    }

    /// Re-derive the armed state for every task.
    pub fn schedule_reminders(&mut self) {
        let now = Utc::now();
        for task in &self.tasks {
            self.reminders.sync(task, now);
        }
    }

    /// Fire every due reminder. Driven by the composition root's tick loop.
    pub fn fire_due_reminders(&mut self, now: chrono::DateTime<Utc>) -> usize {
        self.reminders.fire_due(now)
    }

    pub fn armed_reminder_count(&self) -> usize {
        self.reminders.armed_count()
    }

    // ------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------

    /// Append a task. The task carries its caller-assigned unique id.
    pub fn add_task(&mut self, task: Task) -> Result<()> {
        self.reminders.sync(&task, Utc::now());
        self.tasks.push(task);
        self.storage.persist_tasks(&self.tasks)
    }

    /// Merge a patch into the matching task. No-op if the id is unknown.
    pub fn update_task(&mut self, id: Uuid, patch: TaskPatch) -> Result<()> {
        let task = match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => task,
            None => return Ok(()),
        };
        patch.apply(task);
        self.reminders.sync(task, Utc::now());
        self.storage.persist_tasks(&self.tasks)
    }

    /// Flip a task's completion. On the transition to completed the stats
    /// counter is bumped; toggling back never decrements it.
    pub fn toggle_task(&mut self, id: Uuid) -> Result<()> {
        let now = Utc::now();
        let completed = {
            let task = match self.tasks.iter_mut().find(|t| t.id == id) {
                Some(task) => task,
                None => return Ok(()),
            };
            task.toggle(now);
            self.reminders.sync(task, now);
            task.completed
        };
        self.storage.persist_tasks(&self.tasks)?;

        if completed {
            self.record_complete()?;
        }
        Ok(())
    }

    /// Delete a task, cancelling any pending reminder so it can never fire
    /// for an id that no longer exists.
    pub fn remove_task(&mut self, id: Uuid) -> Result<()> {
        self.reminders.cancel(id);
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            return Ok(());
        }
        self.storage.persist_tasks(&self.tasks)
    }

    /// Assign `order = index` to every task whose id appears in
    /// `ordered_ids`; tasks not listed keep their prior order.
    ///
    /// The `project_id` parameter is part of the contract but the reindex
    /// applies globally by id match; callers must pass an `ordered_ids`
    /// list already filtered to one project's tasks.
    pub fn reorder_tasks(&mut self, _project_id: Option<Uuid>, ordered_ids: &[Uuid]) -> Result<()> {
        for task in &mut self.tasks {
            if let Some(index) = ordered_ids.iter().position(|id| *id == task.id) {
                task.order = Some(index as u32);
            }
        }
        self.storage.persist_tasks(&self.tasks)
    }

    // ------------------------------------------------------------------
    // Projects
    // ------------------------------------------------------------------

    pub fn add_project(&mut self, project: Project) -> Result<()> {
        self.projects.push(project);
        self.storage.persist_projects(&self.projects)
    }

    /// Delete a project and move its tasks back to the Inbox. Tasks are
    /// never cascade-deleted.
    pub fn remove_project(&mut self, id: Uuid) -> Result<()> {
        self.projects.retain(|p| p.id != id);
        self.storage.persist_projects(&self.projects)?;

        let mut touched = false;
        for task in &mut self.tasks {
            if task.project_id == Some(id) {
                task.project_id = None;
                touched = true;
            }
        }
        if touched {
            self.storage.persist_tasks(&self.tasks)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Subtasks
    // ------------------------------------------------------------------

    pub fn add_subtask(&mut self, task_id: Uuid, subtask: Subtask) -> Result<()> {
        let task = match self.tasks.iter_mut().find(|t| t.id == task_id) {
            Some(task) => task,
            None => return Ok(()),
        };
        task.add_subtask(subtask);
        self.storage.persist_tasks(&self.tasks)
    }

    /// Flip one subtask. The parent task's own completion is untouched;
    /// there is no auto-completion rollup.
    pub fn toggle_subtask(&mut self, task_id: Uuid, subtask_id: Uuid) -> Result<()> {
        let task = match self.tasks.iter_mut().find(|t| t.id == task_id) {
            Some(task) => task,
            None => return Ok(()),
        };
        if !task.toggle_subtask(subtask_id) {
            return Ok(());
        }
        self.storage.persist_tasks(&self.tasks)
    }

    // ------------------------------------------------------------------
    // Templates
    // ------------------------------------------------------------------

    pub fn add_template(&mut self, template: Template) -> Result<()> {
        self.templates.push(template);
        self.storage.persist_templates(&self.templates)
    }

    /// Merge a patch into a template's name and blueprint fields
    /// independently. No-op if the id is unknown.
    pub fn update_template(&mut self, id: Uuid, patch: TemplatePatch) -> Result<()> {
        let template = match self.templates.iter_mut().find(|t| t.id == id) {
            Some(template) => template,
            None => return Ok(()),
        };
        patch.apply(template);
        self.storage.persist_templates(&self.templates)
    }

    /// Delete a template. With `remove_associated_tasks`, every task whose
    /// origin-template reference matches is deleted too, its reminder
    /// cancelled first.
    pub fn remove_template(&mut self, id: Uuid, options: RemoveTemplateOptions) -> Result<()> {
        self.templates.retain(|t| t.id != id);
        self.storage.persist_templates(&self.templates)?;

        if options.remove_associated_tasks {
            let doomed: Vec<Uuid> = self
                .tasks
                .iter()
                .filter(|t| t.origin_template_id == Some(id))
                .map(|t| t.id)
                .collect();
            if !doomed.is_empty() {
                for task_id in &doomed {
                    self.reminders.cancel(*task_id);
                }
                self.tasks.retain(|t| t.origin_template_id != Some(id));
                self.storage.persist_tasks(&self.tasks)?;
            }
        }
        Ok(())
    }

    /// Stamp out a new task from a template's blueprint and append it.
    /// Silent no-op if the template id is unknown. Returns the new task's id.
    pub fn apply_template(
        &mut self,
        template_id: Uuid,
        project_id: Option<Uuid>,
    ) -> Result<Option<Uuid>> {
        let template = match self.templates.iter().find(|t| t.id == template_id) {
            Some(template) => template,
            None => return Ok(None),
        };
        let task = template.instantiate(project_id);
        let task_id = task.id;
        self.add_task(task)?;
        Ok(Some(task_id))
    }

    // ------------------------------------------------------------------
    // Stats
    // ------------------------------------------------------------------

    pub fn record_complete(&mut self) -> Result<()> {
        self.stats.record_completion();
        self.storage.persist_stats(&self.stats)
    }

    // ------------------------------------------------------------------
    // Reset / teardown
    // ------------------------------------------------------------------

    /// Factory reset: cancel every armed reminder, empty all four
    /// collections, and persist the empty state.
    pub fn clear(&mut self) -> Result<()> {
        self.reminders.cancel_all();
        self.tasks.clear();
        self.projects.clear();
        self.templates.clear();
        self.stats = Stats::default();

        self.storage.persist_tasks(&self.tasks)?;
        self.storage.persist_projects(&self.projects)?;
        self.storage.persist_templates(&self.templates)?;
        self.storage.persist_stats(&self.stats)
    }

    /// Shutdown hook: disarm all timers without touching persisted state.
    pub fn teardown(&mut self) {
        self.reminders.cancel_all();
    }
}
