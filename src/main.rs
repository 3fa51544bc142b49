mod domain;
mod focus;
mod notifications;
mod persistence;
mod reminder;
mod store;
mod ticker;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use domain::{Blueprint, Priority, Project, Subtask, Task, TaskPatch, Template, TemplatePatch};
use focus::{FocusEvent, FocusPhase, FocusSession, FOCUS_PRESETS};
use notifications::{DesktopNotifier, Notifier};
use persistence::Storage;
use reminder::ReminderScheduler;
use std::io::Write;
use std::path::PathBuf;
use store::{RemoveTemplateOptions, Store};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "taskflow")]
#[command(about = "A local-first personal task manager with reminders and a focus timer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a task
    Add {
        title: String,
        /// Project to file the task under (defaults to the Inbox)
        #[arg(short, long)]
        project: Option<Uuid>,
        /// Priority: low, med or high
        #[arg(long)]
        priority: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Arm a reminder this many minutes from now
        #[arg(long)]
        remind_in: Option<i64>,
        /// Add a subtask (repeatable)
        #[arg(long = "subtask")]
        subtasks: Vec<String>,
    },
    /// Edit a task; omitted options are left unchanged
    Edit {
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Move to this project
        #[arg(long)]
        project: Option<Uuid>,
        /// Move back to the Inbox
        #[arg(long)]
        inbox: bool,
        /// Re-arm the reminder this many minutes from now
        #[arg(long)]
        remind_in: Option<i64>,
        /// Drop any pending reminder
        #[arg(long)]
        clear_reminder: bool,
    },
    /// List tasks
    List {
        /// Only tasks in this project
        #[arg(short, long)]
        project: Option<Uuid>,
        /// Include completed tasks
        #[arg(long)]
        all: bool,
    },
    /// Toggle a task's completion
    Toggle { id: Uuid },
    /// Remove a task
    Rm { id: Uuid },
    /// Resequence tasks: order follows the given id list
    Reorder {
        /// Project whose tasks the id list belongs to
        #[arg(short, long)]
        project: Option<Uuid>,
        ids: Vec<Uuid>,
    },
    /// Add a subtask to a task
    AddSubtask { task: Uuid, title: String },
    /// Toggle one subtask's completion
    ToggleSubtask { task: Uuid, subtask: Uuid },
    /// Add a project
    AddProject {
        name: String,
        #[arg(long)]
        color: Option<String>,
    },
    /// Remove a project; its tasks move back to the Inbox
    RmProject { id: Uuid },
    /// Add a template
    AddTemplate {
        name: String,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long, default_value = "")]
        notes: String,
        /// Number of subtasks to stamp out
        #[arg(long, default_value_t = 0)]
        subtask_count: usize,
        /// Name for a generated subtask (repeatable; missing names get placeholders)
        #[arg(long = "subtask-name")]
        subtask_names: Vec<String>,
    },
    /// Edit a template; omitted options are left unchanged
    EditTemplate {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        subtask_count: Option<usize>,
    },
    /// Stamp a new task out of a template
    Apply {
        template: Uuid,
        #[arg(short, long)]
        project: Option<Uuid>,
    },
    /// Remove a template
    RmTemplate {
        id: Uuid,
        /// Also delete every task created from this template
        #[arg(long)]
        with_tasks: bool,
    },
    /// Export all data as one JSON document
    Export {
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import a previously exported JSON document
    Import { file: PathBuf },
    /// Show aggregate stats
    Stats,
    /// Delete all data
    Clear {
        /// Confirm the factory reset
        #[arg(long)]
        yes: bool,
    },
    /// Stay running and fire due reminders
    Watch,
    /// Run a focus session, then a break, against an optional task
    Focus {
        #[arg(long)]
        task: Option<Uuid>,
        /// Focus length in minutes (1, 5, 25, 45 or 60)
        #[arg(long, default_value_t = 25)]
        mins: u32,
    },
}

fn parse_priority(tag: &str) -> Result<Priority> {
    Priority::from_tag(tag)
        .with_context(|| format!("Unknown priority '{}': expected low, med or high", tag))
}

fn parse_due(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").context("Invalid due date: expected YYYY-MM-DD")
}

fn main() -> Result<()> {
    let _logger = flexi_logger::Logger::try_with_env_or_str("info")
        .context("Invalid log specification")?
        .start()
        .context("Failed to initialize logging")?;

    let cli = Cli::parse();

    let storage = Storage::open_default()?;
    let reminders = ReminderScheduler::new(Box::new(DesktopNotifier));
    let mut store = Store::new(storage.clone(), reminders);
    store.load();

    match cli.command {
        Commands::Add {
            title,
            project,
            priority,
            due,
            notes,
            remind_in,
            subtasks,
        } => {
            let mut task = Task::new(title);
            task.project_id = project;
            if let Some(tag) = priority {
                task.priority = parse_priority(&tag)?;
            }
            if let Some(date) = due {
                task.due_date = Some(parse_due(&date)?);
            }
            task.notes = notes;
            if let Some(mins) = remind_in {
                task.reminder_at = Some(Utc::now() + chrono::Duration::minutes(mins));
            }
            for title in subtasks {
                task.add_subtask(Subtask::new(title));
            }
            let id = task.id;
            store.add_task(task)?;
            println!("Added task {}", id);
        }
        Commands::Edit {
            id,
            title,
            priority,
            due,
            notes,
            project,
            inbox,
            remind_in,
            clear_reminder,
        } => {
            let patch = TaskPatch {
                title,
                priority: priority.as_deref().map(parse_priority).transpose()?,
                due_date: due.as_deref().map(parse_due).transpose()?.map(Some),
                notes: notes.map(Some),
                project_id: if inbox { Some(None) } else { project.map(Some) },
                reminder_at: if clear_reminder {
                    Some(None)
                } else {
                    remind_in.map(|mins| Some(Utc::now() + chrono::Duration::minutes(mins)))
                },
                ..Default::default()
            };
            store.update_task(id, patch)?;
            println!("Updated task {}", id);
        }
        Commands::List { project, all } => {
            let mut rows: Vec<&Task> = store
                .tasks
                .iter()
                .filter(|t| project.is_none() || t.project_id == project)
                .filter(|t| all || !t.completed)
                .collect();
            rows.sort_by_key(|t| (t.order.unwrap_or(u32::MAX), t.created_at));

            for task in rows {
                let mark = if task.completed { "x" } else { " " };
                let due = task
                    .due_date
                    .map(|d| format!("  due {}", d))
                    .unwrap_or_default();
                println!(
                    "[{}] {} {}  {}{}",
                    mark,
                    task.priority.badge(),
                    task.id,
                    task.title,
                    due
                );
                for subtask in &task.subtasks {
                    let mark = if subtask.completed { "x" } else { " " };
                    println!("    [{}] {}  {}", mark, subtask.id, subtask.title);
                }
            }
        }
        Commands::Toggle { id } => {
            store.toggle_task(id)?;
            if let Some(task) = store.tasks.iter().find(|t| t.id == id) {
                if task.completed {
                    DesktopNotifier.notify("Task completed", &task.title);
                }
                println!(
                    "{} ({}) is now {}",
                    task.title,
                    task.priority.as_tag(),
                    if task.completed { "done" } else { "open" }
                );
            }
        }
        Commands::Rm { id } => {
            store.remove_task(id)?;
            println!("Removed task {}", id);
        }
        Commands::Reorder { project, ids } => {
            store.reorder_tasks(project, &ids)?;
            println!("Reordered {} task(s)", ids.len());
        }
        Commands::AddSubtask { task, title } => {
            store.add_subtask(task, Subtask::new(title))?;
            println!("Added subtask to {}", task);
        }
        Commands::ToggleSubtask { task, subtask } => {
            store.toggle_subtask(task, subtask)?;
            println!("Toggled subtask {}", subtask);
        }
        Commands::AddProject { name, color } => {
            let mut project = Project::new(name);
            project.color = color;
            let id = project.id;
            store.add_project(project)?;
            println!("Added project {}", id);
        }
        Commands::RmProject { id } => {
            store.remove_project(id)?;
            println!("Removed project {}; its tasks moved to the Inbox", id);
        }
        Commands::AddTemplate {
            name,
            priority,
            notes,
            subtask_count,
            subtask_names,
        } => {
            let blueprint = Blueprint {
                priority: priority
                    .as_deref()
                    .map(parse_priority)
                    .transpose()?
                    .unwrap_or_default(),
                notes,
                subtask_count,
                subtask_names,
            };
            let template = Template::new(name, blueprint);
            let id = template.id;
            store.add_template(template)?;
            println!("Added template {}", id);
        }
        Commands::EditTemplate {
            id,
            name,
            priority,
            notes,
            subtask_count,
        } => {
            let patch = TemplatePatch {
                name,
                priority: priority.as_deref().map(parse_priority).transpose()?,
                notes,
                subtask_count,
                subtask_names: None,
            };
            store.update_template(id, patch)?;
            println!("Updated template {}", id);
        }
        Commands::Apply { template, project } => match store.apply_template(template, project)? {
            Some(task_id) => println!("Created task {}", task_id),
            None => println!("No template with id {}", template),
        },
        Commands::RmTemplate { id, with_tasks } => {
            store.remove_template(
                id,
                RemoveTemplateOptions {
                    remove_associated_tasks: with_tasks,
                },
            )?;
            println!("Removed template {}", id);
        }
        Commands::Export { output } => {
            let document = storage.export_all()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &document)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Exported to {}", path.display());
                }
                None => println!("{}", document),
            }
        }
        Commands::Import { file } => {
            let document = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            storage.import_all(&document)?;
            // Import writes the durable mirror only; a fresh load makes it live
            store.load();
            println!(
                "Imported: {} tasks, {} projects, {} templates",
                store.tasks.len(),
                store.projects.len(),
                store.templates.len()
            );
        }
        Commands::Stats => {
            println!("Data directory: {}", storage.dir().display());
            println!("Tasks completed (lifetime): {}", store.stats.completed);
            println!(
                "Open tasks: {}",
                store.tasks.iter().filter(|t| !t.completed).count()
            );
            println!("Projects: {}", store.projects.len());
            println!("Templates: {}", store.templates.len());
        }
        Commands::Clear { yes } => {
            if !yes {
                anyhow::bail!("Refusing to delete all data without --yes");
            }
            store.clear()?;
            println!("All data cleared");
        }
        Commands::Watch => {
            if !DesktopNotifier::permission_granted() {
                log::info!("Desktop notifications unavailable; reminders fall back to the log");
            }
            println!(
                "Watching {} armed reminder(s); Ctrl-C to stop",
                store.armed_reminder_count()
            );
            run_watch(&mut store);
        }
        Commands::Focus { task, mins } => {
            run_focus(&mut store, task, mins)?;
        }
    }

    store.teardown();
    Ok(())
}

/// Tick loop that fires reminders as they come due.
fn run_watch(store: &mut Store) {
    let tick = ticker::tick_duration();
    loop {
        std::thread::sleep(tick);
        let fired = store.fire_due_reminders(Utc::now());
        if fired > 0 {
            println!("Fired {} reminder(s)", fired);
        }
    }
}

/// Run one focus phase and the following break, marking the bound task
/// completed when the focus phase finishes.
fn run_focus(store: &mut Store, task: Option<Uuid>, mins: u32) -> Result<()> {
    let focus_secs = mins * 60;
    if !FOCUS_PRESETS.contains(&focus_secs) {
        anyhow::bail!("Focus length must be 1, 5, 25, 45 or 60 minutes");
    }
    if let Some(id) = task {
        if !store.tasks.iter().any(|t| t.id == id) {
            anyhow::bail!("No task with id {}", id);
        }
    }

    let mut session = FocusSession::new(focus_secs);
    session.select_task(task);
    session.start();
    if let Some(id) = session.task_id() {
        println!("Focusing on task {}", id);
    }

    let tick = ticker::tick_duration();
    loop {
        std::thread::sleep(tick);
        // Reminders keep flowing during a focus session
        store.fire_due_reminders(Utc::now());

        let phase = match session.phase() {
            FocusPhase::Focus => "focus",
            FocusPhase::Break => "break",
        };
        print!(
            "\r{} {} ({:>3.0}%)  ",
            phase,
            session.remaining_formatted(),
            session.progress() * 100.0
        );
        let _ = std::io::stdout().flush();

        match session.tick() {
            Some(FocusEvent::FocusCompleted { task_id }) => {
                println!();
                if let Some(id) = task_id {
                    store.update_task(
                        id,
                        TaskPatch {
                            completed: Some(true),
                            completed_at: Some(Some(Utc::now())),
                            ..Default::default()
                        },
                    )?;
                }
                DesktopNotifier.notify("Focus", "Focus session completed!");
                println!("Focus session complete. Break time");
                session.start();
            }
            Some(FocusEvent::BreakCompleted) => {
                println!();
                DesktopNotifier.notify("Focus", "Break finished! Ready for another session.");
                return Ok(());
            }
            None => {}
        }
    }
}
