use crate::domain::{Project, Stats, Task, Template};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Persisted key for each collection. The key namespace is the only durable
/// external contract; each key maps to one JSON file in the data directory.
pub const K_TASKS: &str = "tf_tasks_v1";
pub const K_PROJECTS: &str = "tf_projects_v1";
pub const K_TEMPLATES: &str = "tf_templates_v1";
pub const K_STATS: &str = "tf_stats_v1";

/// Failure modes of a bulk import. A parse failure happens before any write,
/// so a rejected document never leaves a partial import behind.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("backup document is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to write imported collection: {0}")]
    Write(anyhow::Error),
}

/// The export document: one JSON object carrying all four collections.
#[derive(Debug, Serialize, Deserialize)]
pub struct Backup {
    pub tasks: Vec<Task>,
    pub projects: Vec<Project>,
    pub templates: Vec<Template>,
    pub stats: Stats,
}

/// Import document. Every field is optional: fields absent from the input
/// leave the corresponding persisted collection untouched, and unknown
/// top-level fields are ignored.
#[derive(Debug, Default, Deserialize)]
struct BackupPatch {
    #[serde(default)]
    tasks: Option<Vec<Task>>,
    #[serde(default)]
    projects: Option<Vec<Project>>,
    #[serde(default)]
    templates: Option<Vec<Template>>,
    #[serde(default)]
    stats: Option<Stats>,
}

/// Durable key-value mirror of the store's collections.
///
/// Reads never fail: a missing or unreadable file degrades to the empty
/// default so a first run (or a damaged file) starts clean. Writes replace
/// the whole collection atomically.
#[derive(Debug, Clone)]
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Open storage at the default data directory, creating it if needed.
    pub fn open_default() -> Result<Self> {
        let dir = default_data_dir()?;
        if !dir.exists() {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        Ok(Self::new(dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn load_collection<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let path = self.key_path(key);
        let content = match read_file(&path) {
            Ok(content) if !content.is_empty() => content,
            Ok(_) => return T::default(),
            Err(e) => {
                log::warn!("Could not read {}: {:#}; starting empty", key, e);
                return T::default();
            }
        };
        match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Could not parse {}: {}; starting empty", key, e);
                T::default()
            }
        }
    }

    fn persist_collection<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)
            .with_context(|| format!("Failed to serialize collection: {}", key))?;
        atomic_write(self.key_path(key), &json)
    }

    pub fn load_tasks(&self) -> Vec<Task> {
        self.load_collection(K_TASKS)
    }

    pub fn persist_tasks(&self, tasks: &[Task]) -> Result<()> {
        self.persist_collection(K_TASKS, &tasks)
    }

    pub fn load_projects(&self) -> Vec<Project> {
        self.load_collection(K_PROJECTS)
    }

    pub fn persist_projects(&self, projects: &[Project]) -> Result<()> {
        self.persist_collection(K_PROJECTS, &projects)
    }

    pub fn load_templates(&self) -> Vec<Template> {
        self.load_collection(K_TEMPLATES)
    }

    pub fn persist_templates(&self, templates: &[Template]) -> Result<()> {
        self.persist_collection(K_TEMPLATES, &templates)
    }

    pub fn load_stats(&self) -> Stats {
        self.load_collection(K_STATS)
    }

    pub fn persist_stats(&self, stats: &Stats) -> Result<()> {
        self.persist_collection(K_STATS, stats)
    }

    /// Produce the full backup document as pretty-printed JSON.
    pub fn export_all(&self) -> Result<String> {
        let backup = Backup {
            tasks: self.load_tasks(),
            projects: self.load_projects(),
            templates: self.load_templates(),
            stats: self.load_stats(),
        };
        serde_json::to_string_pretty(&backup).context("Failed to serialize backup document")
    }

    /// Overwrite persisted collections from a backup document.
    ///
    /// Only the top-level fields present in the document are written; a
    /// partial document imports partially. This does not touch any in-memory
    /// state; callers re-run the store's `load()` afterwards.
    pub fn import_all(&self, json: &str) -> Result<(), ImportError> {
        let patch: BackupPatch = serde_json::from_str(json)?;
        if let Some(tasks) = &patch.tasks {
            self.persist_tasks(tasks).map_err(ImportError::Write)?;
        }
        if let Some(projects) = &patch.projects {
            self.persist_projects(projects).map_err(ImportError::Write)?;
        }
        if let Some(templates) = &patch.templates {
            self.persist_templates(templates)
                .map_err(ImportError::Write)?;
        }
        if let Some(stats) = &patch.stats {
            self.persist_stats(stats).map_err(ImportError::Write)?;
        }
        Ok(())
    }
}

/// Default data directory: a local `.taskflow` found by walking up from the
/// current directory, else `~/.taskflow`.
pub fn default_data_dir() -> Result<PathBuf> {
    let current_dir = env::current_dir().context("Could not determine current directory")?;
    if let Some(local) = find_local_dir(&current_dir) {
        return Ok(local);
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".taskflow"))
}

fn find_local_dir(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir;

    loop {
        let candidate = current.join(".taskflow");
        if candidate.is_dir() {
            return Some(candidate);
        }
        current = current.parent()?;
    }
}

/// Atomically write content to a file using temp file + rename
fn atomic_write<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path = path.as_ref();
    let dir = path.parent().context("File path has no parent directory")?;

    let mut temp_file = NamedTempFile::new_in(dir).context("Failed to create temporary file")?;

    temp_file
        .write_all(content.as_bytes())
        .context("Failed to write to temporary file")?;

    temp_file
        .as_file()
        .sync_all()
        .context("Failed to sync temporary file")?;

    temp_file
        .persist(path)
        .with_context(|| format!("Failed to persist file: {}", path.display()))?;

    Ok(())
}

/// Read file content, return empty string if the file doesn't exist
fn read_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(String::new());
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Blueprint, Priority};
    use pretty_assertions::assert_eq;

    fn temp_storage() -> (tempfile::TempDir, Storage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path());
        (dir, storage)
    }

    #[test]
    fn test_first_run_loads_empty_defaults() {
        let (_dir, storage) = temp_storage();
        assert!(storage.load_tasks().is_empty());
        assert!(storage.load_projects().is_empty());
        assert!(storage.load_templates().is_empty());
        assert_eq!(storage.load_stats(), Stats::default());
    }

    #[test]
    fn test_persist_and_load_tasks() {
        let (_dir, storage) = temp_storage();
        let tasks = vec![Task::new("One"), Task::new("Two")];

        storage.persist_tasks(&tasks).unwrap();
        let loaded = storage.load_tasks();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, tasks[0].id);
        assert_eq!(loaded[1].title, "Two");
    }

    #[test]
    fn test_corrupt_collection_degrades_to_default() {
        let (_dir, storage) = temp_storage();
        fs::write(storage.key_path(K_TASKS), "{not json").unwrap();
        assert!(storage.load_tasks().is_empty());
    }

    #[test]
    fn test_persist_overwrites_whole_collection() {
        let (_dir, storage) = temp_storage();
        storage
            .persist_tasks(&[Task::new("One"), Task::new("Two")])
            .unwrap();
        storage.persist_tasks(&[Task::new("Only")]).unwrap();

        let loaded = storage.load_tasks();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].title, "Only");
    }

    #[test]
    fn test_export_import_round_trip() {
        let (_dir, storage) = temp_storage();

        let mut task = Task::new("Round trip");
        task.priority = Priority::High;
        let project = Project::new("Home");
        let template = Template::new(
            "Checklist",
            Blueprint {
                priority: Priority::Low,
                notes: String::new(),
                subtask_count: 2,
                subtask_names: vec!["First".to_string()],
            },
        );
        let mut stats = Stats::default();
        stats.completed = 7;

        storage.persist_tasks(std::slice::from_ref(&task)).unwrap();
        storage
            .persist_projects(std::slice::from_ref(&project))
            .unwrap();
        storage
            .persist_templates(std::slice::from_ref(&template))
            .unwrap();
        storage.persist_stats(&stats).unwrap();

        let exported = storage.export_all().unwrap();

        // Import into a fresh directory and compare observable state
        let (_dir2, other) = temp_storage();
        other.import_all(&exported).unwrap();

        assert_eq!(other.load_tasks(), storage.load_tasks());
        assert_eq!(other.load_projects(), storage.load_projects());
        assert_eq!(other.load_templates(), storage.load_templates());
        assert_eq!(other.load_stats(), stats);
    }

    #[test]
    fn test_partial_import_leaves_other_keys_untouched() {
        let (_dir, storage) = temp_storage();
        storage.persist_tasks(&[Task::new("Keep me")]).unwrap();

        storage
            .import_all(r#"{"projects": [], "unknownField": 1}"#)
            .unwrap();

        // Tasks key was absent from the document, so it survived
        assert_eq!(storage.load_tasks().len(), 1);
        assert!(storage.load_projects().is_empty());
    }

    #[test]
    fn test_malformed_import_is_a_distinct_error_and_writes_nothing() {
        let (_dir, storage) = temp_storage();
        storage.persist_tasks(&[Task::new("Survivor")]).unwrap();

        let err = storage.import_all("{broken").unwrap_err();
        assert!(matches!(err, ImportError::Parse(_)));
        assert_eq!(storage.load_tasks().len(), 1);
    }
}
