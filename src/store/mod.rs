//! Task store: the in-memory project plus its JSON file.
//!
//! Every mutating operation goes through [`TaskStore::with_write`], which
//! applies the change, writes the whole document, and rolls the in-memory
//! state back if either step fails.

mod document;
pub mod tasks;
pub mod tree;

pub use document::DEFAULT_PROJECT_NAME;
pub use tree::{EligibleRow, ListOptions, SortOrder, StatusFilter, TreeRow};

use crate::clock::{Clock, SystemClock, Timestamp};
use crate::error::{PlanitError, PlanitResult};
use crate::types::Task;
use document::{ProjectDocument, repair_tree};
use indexmap::{IndexMap, IndexSet};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Default project file name, created in the working directory.
pub const DEFAULT_PROJECT_FILE: &str = ".planit.json";

/// Store handle owning every task of one project.
pub struct TaskStore {
    path: PathBuf,
    project_name: String,
    created_at: Option<Timestamp>,
    tasks: IndexMap<String, Task>,
    active: IndexSet<String>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TaskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskStore")
            .field("path", &self.path)
            .field("project_name", &self.project_name)
            .field("tasks", &self.tasks.len())
            .field("active", &self.active)
            .finish()
    }
}

impl TaskStore {
    /// Create a new empty project file. Never overwrites an existing one.
    pub fn initialize<P: AsRef<Path>>(path: P, project_name: &str) -> PlanitResult<Self> {
        Self::initialize_with_clock(path, project_name, Arc::new(SystemClock))
    }

    pub fn initialize_with_clock<P: AsRef<Path>>(
        path: P,
        project_name: &str,
        clock: Arc<dyn Clock>,
    ) -> PlanitResult<Self> {
        let path = path.as_ref();
        let document = ProjectDocument::empty(project_name, clock.now());
        let contents = serde_json::to_vec_pretty(&document)
            .map_err(|e| PlanitError::unserializable(path, e))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| PlanitError::io(parent, e))?;
        }

        // create_new makes the existence check and the creation one step.
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => PlanitError::project_exists(path),
                _ => PlanitError::io(path, e),
            })?;
        let written = file.write_all(&contents).and_then(|_| file.sync_all());
        drop(file);
        discard_on_error(path, written)?;

        info!(path = %path.display(), project = project_name, "Initialized project");

        Ok(Self {
            path: path.to_path_buf(),
            project_name: document.project_name,
            created_at: document.created_at,
            tasks: IndexMap::new(),
            active: IndexSet::new(),
            clock,
        })
    }

    /// Load an existing project file.
    pub fn load<P: AsRef<Path>>(path: P) -> PlanitResult<Self> {
        Self::load_with_clock(path, Arc::new(SystemClock))
    }

    pub fn load_with_clock<P: AsRef<Path>>(path: P, clock: Arc<dyn Clock>) -> PlanitResult<Self> {
        let path = path.as_ref();
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(PlanitError::project_not_found(path));
            }
            Err(e) => return Err(PlanitError::io(path, e)),
        };

        let mut document: ProjectDocument =
            serde_json::from_str(&raw).map_err(|e| PlanitError::corrupt(path, e))?;

        let repaired = repair_tree(&mut document.tasks);
        let active = document.take_active_set();

        debug!(
            path = %path.display(),
            tasks = document.tasks.len(),
            active = active.len(),
            repaired,
            "Loaded project"
        );

        Ok(Self {
            path: path.to_path_buf(),
            project_name: document.project_name,
            created_at: document.created_at,
            tasks: document.tasks,
            active,
            clock,
        })
    }

    /// Write the full state to the store's own path.
    pub fn save(&self) -> PlanitResult<()> {
        self.save_to(&self.path)
    }

    /// Write the full state to `path` via a temp file and a rename, so a
    /// crash mid-write leaves the previous file intact.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> PlanitResult<()> {
        let path = path.as_ref();
        let document = ProjectDocument {
            project_name: self.project_name.clone(),
            tasks: self.tasks.clone(),
            active_tasks: self.active.iter().cloned().collect(),
            active_task: None,
            created_at: self.created_at,
            updated_at: Some(self.clock.now()),
        };
        let contents = serde_json::to_vec_pretty(&document)
            .map_err(|e| PlanitError::unserializable(path, e))?;

        write_atomic(path, &contents)?;
        debug!(path = %path.display(), tasks = self.tasks.len(), "Saved project");
        Ok(())
    }

    /// Run a mutation and persist it; on any failure restore the previous state.
    pub(crate) fn with_write<T, F>(&mut self, op: F) -> PlanitResult<T>
    where
        F: FnOnce(&mut Self) -> PlanitResult<T>,
    {
        let snapshot = (self.tasks.clone(), self.active.clone());
        let result = match op(self) {
            Ok(value) => self.save().map(|_| value),
            Err(e) => Err(e),
        };
        if result.is_err() {
            (self.tasks, self.active) = snapshot;
        }
        result
    }

    pub(crate) fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// All tasks in document order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }
}

/// Remove a freshly created `path` when writing it failed, so no partial
/// document is left behind.
fn discard_on_error<T>(path: &Path, result: std::io::Result<T>) -> PlanitResult<T> {
    result.map_err(|e| {
        let _ = fs::remove_file(path);
        PlanitError::io(path, e)
    })
}

fn write_atomic(path: &Path, contents: &[u8]) -> PlanitResult<()> {
    let tmp = path.with_extension("json.tmp");

    let written = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp)
        .and_then(|mut file| {
            file.write_all(contents)?;
            file.sync_all()
        });
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(PlanitError::io(&tmp, e));
    }

    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        PlanitError::io(path, e)
    })
}
