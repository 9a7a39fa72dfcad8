//! On-disk project document and load-time repair.

use crate::clock::Timestamp;
use crate::types::{Task, null_as_default, timestamp};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use tracing::warn;

pub const DEFAULT_PROJECT_NAME: &str = "planit";

fn default_project_name() -> String {
    DEFAULT_PROJECT_NAME.to_string()
}

fn project_name_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_else(default_project_name))
}

/// The JSON document persisted next to the project.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ProjectDocument {
    #[serde(
        default = "default_project_name",
        deserialize_with = "project_name_or_default"
    )]
    pub project_name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub tasks: IndexMap<String, Task>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub active_tasks: Vec<String>,

    /// Single active task written by older releases. Read only.
    #[serde(default, skip_serializing)]
    pub active_task: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "timestamp::option"
    )]
    pub created_at: Option<Timestamp>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "timestamp::option"
    )]
    pub updated_at: Option<Timestamp>,
}

impl ProjectDocument {
    pub fn empty(project_name: &str, now: Timestamp) -> Self {
        Self {
            project_name: project_name.to_string(),
            tasks: IndexMap::new(),
            active_tasks: Vec::new(),
            active_task: None,
            created_at: Some(now),
            updated_at: None,
        }
    }

    /// Merge the legacy and current active fields into one ordered set.
    ///
    /// Unknown ids are dropped, as are completed or clean tasks, which could
    /// never have been activated.
    pub fn take_active_set(&mut self) -> IndexSet<String> {
        let mut active: IndexSet<String> = self.active_tasks.drain(..).collect();
        if let Some(legacy) = self.active_task.take() {
            active.insert(legacy);
        }
        active.retain(|id| match self.tasks.get(id) {
            None => {
                warn!(task_id = %id, "Dropping unknown task from active set");
                false
            }
            Some(task) if task.completed || task.clean => {
                warn!(
                    task_id = %id,
                    completed = task.completed,
                    clean = task.clean,
                    "Dropping finished task from active set"
                );
                false
            }
            Some(_) => true,
        });
        active
    }
}

/// Restore the tree invariants on a freshly loaded task map.
///
/// Returns the number of tasks that had to be touched. A document written by
/// this crate needs no repair.
pub(crate) fn repair_tree(tasks: &mut IndexMap<String, Task>) -> usize {
    let mut touched: HashSet<String> = HashSet::new();

    for (key, task) in tasks.iter_mut() {
        if &task.id != key {
            warn!(key = %key, record_id = %task.id, "Task record id differs from its key, using key");
            task.id = key.clone();
            touched.insert(key.clone());
        }
    }

    // Parent links must point at an existing task.
    let ids: HashSet<String> = tasks.keys().cloned().collect();
    for task in tasks.values_mut() {
        let dangling = task
            .parent_id
            .as_ref()
            .is_some_and(|parent| parent == &task.id || !ids.contains(parent));
        if dangling {
            warn!(task_id = %task.id, parent_id = ?task.parent_id, "Detaching task from missing parent");
            task.parent_id = None;
            touched.insert(task.id.clone());
        }
    }

    // Break parent cycles: the first task found on a loop becomes a root.
    let keys: Vec<String> = tasks.keys().cloned().collect();
    for id in &keys {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut current = tasks.get(id).and_then(|t| t.parent_id.as_deref());
        let mut cyclic = false;
        while let Some(cur) = current {
            if cur == id.as_str() {
                cyclic = true;
                break;
            }
            // A loop further up that does not contain `id` is broken at its own member.
            if !seen.insert(cur) {
                break;
            }
            current = tasks.get(cur).and_then(|t| t.parent_id.as_deref());
        }
        if cyclic {
            warn!(task_id = %id, "Breaking parent cycle");
            if let Some(task) = tasks.get_mut(id) {
                task.parent_id = None;
            }
            touched.insert(id.clone());
        }
    }

    // Child lists hold only existing children that point back, once each.
    let parent_of: IndexMap<String, Option<String>> = tasks
        .iter()
        .map(|(id, t)| (id.clone(), t.parent_id.clone()))
        .collect();
    for (id, task) in tasks.iter_mut() {
        let before = task.subtasks.len();
        let mut seen: HashSet<String> = HashSet::new();
        task.subtasks.retain(|child| {
            let belongs = parent_of
                .get(child)
                .is_some_and(|parent| parent.as_deref() == Some(id.as_str()));
            belongs && seen.insert(child.clone())
        });
        if task.subtasks.len() != before {
            warn!(task_id = %id, pruned = before - task.subtasks.len(), "Pruned stale subtask references");
            touched.insert(id.clone());
        }
    }

    // Children that name a parent which does not list them get appended.
    let orphans: Vec<(String, String)> = tasks
        .iter()
        .filter_map(|(id, task)| {
            let parent = task.parent_id.as_ref()?;
            let listed = tasks
                .get(parent)
                .is_some_and(|p| p.subtasks.iter().any(|c| c == id));
            (!listed).then(|| (parent.clone(), id.clone()))
        })
        .collect();
    for (parent, child) in orphans {
        warn!(task_id = %child, parent_id = %parent, "Relinking task into its parent's subtasks");
        if let Some(p) = tasks.get_mut(&parent) {
            p.subtasks.push(child);
        }
        touched.insert(parent);
    }

    touched.len()
}
