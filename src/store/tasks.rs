//! Task CRUD, activation, cascades and moves.

use super::TaskStore;
use crate::clock::Timestamp;
use crate::error::{PlanitError, PlanitResult};
use crate::types::Task;
use std::collections::HashSet;
use tracing::{debug, info};

impl TaskStore {
    /// Create a task, optionally under `parent_id`, and persist it.
    pub fn create_task(
        &mut self,
        title: &str,
        description: &str,
        parent_id: Option<&str>,
    ) -> PlanitResult<String> {
        let now = self.now();
        let task = Task::new(title, description, parent_id.map(str::to_string), now)?;
        let task_id = task.id.clone();

        self.with_write(|store| {
            if let Some(pid) = parent_id {
                let parent = store
                    .tasks
                    .get_mut(pid)
                    .ok_or_else(|| PlanitError::task_not_found(pid))?;
                parent.add_subtask(&task.id, now)?;
            }
            store.tasks.insert(task.id.clone(), task);
            Ok(())
        })?;

        info!(task_id = %task_id, parent_id = ?parent_id, "Created task");
        Ok(task_id)
    }

    pub fn get(&self, task_id: &str) -> Option<&Task> {
        self.tasks.get(task_id)
    }

    /// Case-insensitive exact title match. The first task in document order wins.
    pub fn find_by_exact_name(&self, name: &str) -> Option<&Task> {
        let wanted = name.trim().to_lowercase();
        self.tasks
            .values()
            .find(|task| task.title.to_lowercase() == wanted)
    }

    /// Case-insensitive substring match over titles, in document order.
    pub fn find_by_partial_name(&self, fragment: &str) -> Vec<&Task> {
        let wanted = fragment.trim().to_lowercase();
        self.tasks
            .values()
            .filter(|task| task.title.to_lowercase().contains(&wanted))
            .collect()
    }

    /// Existing children of a task, in display order.
    pub fn subtasks(&self, task_id: &str) -> Vec<&Task> {
        self.tasks
            .get(task_id)
            .map(|task| self.children_of(task))
            .unwrap_or_default()
    }

    pub fn is_active(&self, task_id: &str) -> bool {
        self.active.contains(task_id)
    }

    /// Active tasks in the order they were taken.
    pub fn active_tasks(&self) -> Vec<&Task> {
        self.active
            .iter()
            .filter_map(|id| self.tasks.get(id))
            .collect()
    }

    /// Mark a task as being worked on. Clean and completed tasks cannot be taken.
    pub fn add_active(&mut self, task_id: &str) -> PlanitResult<()> {
        let task = self
            .tasks
            .get(task_id)
            .ok_or_else(|| PlanitError::task_not_found(task_id))?;
        if task.clean {
            return Err(PlanitError::invalid_operation(format!(
                "Cannot activate clean task: {}",
                task.title
            )));
        }
        if task.completed {
            return Err(PlanitError::invalid_operation(format!(
                "Cannot activate completed task: {}",
                task.title
            )));
        }
        if self.active.contains(task_id) {
            debug!(task_id, "Task already active");
            return Ok(());
        }

        self.with_write(|store| {
            store.active.insert(task_id.to_string());
            Ok(())
        })?;
        info!(task_id, "Activated task");
        Ok(())
    }

    /// Stop working on a task. Unknown or inactive ids are a no-op.
    pub fn remove_active(&mut self, task_id: &str) -> PlanitResult<()> {
        if !self.active.contains(task_id) {
            return Ok(());
        }
        self.with_write(|store| {
            store.active.shift_remove(task_id);
            Ok(())
        })?;
        info!(task_id, "Deactivated task");
        Ok(())
    }

    /// Complete a task and its whole subtree; all of them leave the active set.
    pub fn complete(&mut self, task_id: &str) -> PlanitResult<usize> {
        self.cascade(task_id, "complete", true, Task::mark_completed)
    }

    pub fn uncomplete(&mut self, task_id: &str) -> PlanitResult<usize> {
        self.cascade(task_id, "uncomplete", false, Task::mark_uncompleted)
    }

    /// Archive a task and its whole subtree; all of them leave the active set.
    pub fn mark_clean(&mut self, task_id: &str) -> PlanitResult<usize> {
        self.cascade(task_id, "clean", true, Task::mark_clean)
    }

    pub fn mark_unclean(&mut self, task_id: &str) -> PlanitResult<usize> {
        self.cascade(task_id, "unclean", false, Task::mark_unclean)
    }

    /// Apply `apply` to every task in the subtree, then persist once.
    fn cascade(
        &mut self,
        task_id: &str,
        action: &'static str,
        deactivate: bool,
        apply: fn(&mut Task, Timestamp),
    ) -> PlanitResult<usize> {
        if !self.tasks.contains_key(task_id) {
            return Err(PlanitError::task_not_found(task_id));
        }
        let subtree = self.subtree_ids(task_id);
        let now = self.now();

        self.with_write(|store| {
            for id in &subtree {
                if let Some(task) = store.tasks.get_mut(id) {
                    apply(task, now);
                }
                if deactivate {
                    store.active.shift_remove(id);
                }
            }
            Ok(())
        })?;

        info!(task_id, action, affected = subtree.len(), "Applied cascade");
        Ok(subtree.len())
    }

    /// Delete a task and its subtree. Deleting an unknown id does nothing.
    pub fn delete(&mut self, task_id: &str) -> PlanitResult<usize> {
        let Some(task) = self.tasks.get(task_id) else {
            debug!(task_id, "Delete of unknown task ignored");
            return Ok(0);
        };
        let parent_id = task.parent_id.clone();
        let subtree = self.subtree_ids(task_id);
        let now = self.now();

        self.with_write(|store| {
            if let Some(parent) = parent_id.as_deref().and_then(|p| store.tasks.get_mut(p)) {
                parent.remove_subtask(task_id, now);
            }
            // Leaves first, so no surviving node ever points at a removed one.
            for id in subtree.iter().rev() {
                store.active.shift_remove(id);
                store.tasks.shift_remove(id);
            }
            Ok(())
        })?;

        info!(task_id, removed = subtree.len(), "Deleted task subtree");
        Ok(subtree.len())
    }

    /// Reparent a task under `new_parent_id`, or make it a root when `None`.
    pub fn move_task(&mut self, task_id: &str, new_parent_id: Option<&str>) -> PlanitResult<()> {
        let task = self
            .tasks
            .get(task_id)
            .ok_or_else(|| PlanitError::task_not_found(task_id))?;
        let old_parent = task.parent_id.clone();

        if let Some(target) = new_parent_id {
            if target == task_id {
                return Err(PlanitError::invalid_operation(
                    "Cannot move a task under itself",
                ));
            }
            let parent = self.tasks.get(target).ok_or_else(|| {
                PlanitError::invalid_operation(format!("Target parent not found: {}", target))
            })?;
            if self.is_ancestor_or_self(task_id, target) {
                return Err(PlanitError::invalid_operation(format!(
                    "Cannot move '{}' under its own descendant '{}'",
                    task.title, parent.title
                )));
            }
            if parent.clean {
                return Err(PlanitError::invalid_operation(format!(
                    "Cannot move a task into clean task '{}'",
                    parent.title
                )));
            }
        }

        let now = self.now();
        self.with_write(|store| {
            if let Some(old) = old_parent.as_deref().and_then(|p| store.tasks.get_mut(p)) {
                old.remove_subtask(task_id, now);
            }
            if let Some(target) = new_parent_id {
                if let Some(parent) = store.tasks.get_mut(target) {
                    parent.add_subtask(task_id, now)?;
                }
            }
            if let Some(task) = store.tasks.get_mut(task_id) {
                task.parent_id = new_parent_id.map(str::to_string);
                task.updated_at = now;
            }
            Ok(())
        })?;

        info!(task_id, from = ?old_parent, to = ?new_parent_id, "Moved task");
        Ok(())
    }

    /// Ids of `task_id` and all its descendants, depth-first pre-order.
    pub fn subtree_ids(&self, task_id: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = vec![task_id];

        while let Some(id) = stack.pop() {
            let Some(task) = self.tasks.get(id) else {
                continue;
            };
            if !seen.insert(id) {
                continue;
            }
            out.push(id.to_string());
            stack.extend(task.subtasks.iter().rev().map(String::as_str));
        }
        out
    }

    /// Whether `ancestor` is `task_id` itself or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: &str, task_id: &str) -> bool {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut current = Some(task_id);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            if !seen.insert(id) {
                return false;
            }
            current = self.tasks.get(id).and_then(|t| t.parent_id.as_deref());
        }
        false
    }
}
