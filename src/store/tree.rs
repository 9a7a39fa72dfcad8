//! Hierarchical walks, filters and display ordering.
//!
//! Every view is built from one full depth-first pre-order walk of the forest,
//! so a row's depth is always its real number of ancestors even when the
//! filter hides some of those ancestors.

use super::TaskStore;
use crate::types::Task;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;

/// A task and its depth (number of ancestors, 0 for roots).
pub type TreeRow<'a> = (&'a Task, usize);

/// A tree row annotated with whether the task can be selected for an action.
pub type EligibleRow<'a> = (&'a Task, usize, bool);

/// Which tasks a listing shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Incomplete,
    Completed,
    /// Active tasks plus their ancestors, for context.
    Active,
    /// Only clean tasks (implies clean tasks are included).
    Clean,
}

/// Order of siblings within the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Insertion order of each parent's subtasks.
    #[default]
    Tree,
    /// Active, incomplete, completed, clean; newest lifecycle timestamp first.
    Status,
}

/// Options for [`TaskStore::list`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListOptions {
    pub status: StatusFilter,
    pub include_clean: bool,
    pub sort: SortOrder,
}

impl ListOptions {
    pub fn new(status: StatusFilter) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn include_clean(mut self, include: bool) -> Self {
        self.include_clean = include;
        self
    }

    pub fn sorted(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }
}

/// Display bucket used by [`SortOrder::Status`], in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DisplayBucket {
    Active,
    Incomplete,
    Completed,
    Clean,
}

impl TaskStore {
    /// Tasks without a parent, in document order.
    pub fn roots(&self) -> Vec<&Task> {
        self.tasks
            .values()
            .filter(|task| {
                task.parent_id
                    .as_deref()
                    .is_none_or(|parent| !self.tasks.contains_key(parent))
            })
            .collect()
    }

    pub(crate) fn children_of<'a>(&'a self, task: &'a Task) -> Vec<&'a Task> {
        task.subtasks
            .iter()
            .filter_map(|id| self.tasks.get(id))
            .collect()
    }

    pub fn bucket(&self, task: &Task) -> DisplayBucket {
        if task.clean {
            DisplayBucket::Clean
        } else if self.is_active(&task.id) {
            DisplayBucket::Active
        } else if task.completed {
            DisplayBucket::Completed
        } else {
            DisplayBucket::Incomplete
        }
    }

    fn compare_for_display(&self, a: &Task, b: &Task) -> Ordering {
        self.bucket(a)
            .cmp(&self.bucket(b))
            .then_with(|| b.lifecycle_timestamp().cmp(&a.lifecycle_timestamp()))
    }

    fn order_siblings<'a>(&self, mut siblings: Vec<&'a Task>, sort: SortOrder) -> Vec<&'a Task> {
        if sort == SortOrder::Status {
            // sort_by is stable, so equal keys keep insertion order.
            siblings.sort_by(|a, b| self.compare_for_display(a, b));
        }
        siblings
    }

    /// Full pre-order walk of the forest with an explicit stack.
    pub fn walk(&self, sort: SortOrder) -> Vec<TreeRow<'_>> {
        let mut rows = Vec::with_capacity(self.tasks.len());
        let mut seen: HashSet<&str> = HashSet::new();
        let mut stack: Vec<TreeRow<'_>> = self
            .order_siblings(self.roots(), sort)
            .into_iter()
            .rev()
            .map(|task| (task, 0))
            .collect();

        while let Some((task, depth)) = stack.pop() {
            if !seen.insert(task.id.as_str()) {
                continue;
            }
            rows.push((task, depth));
            let children = self.order_siblings(self.children_of(task), sort);
            stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
        }
        rows
    }

    /// Ids of every active task and all of their ancestors.
    pub fn active_closure(&self) -> HashSet<&str> {
        let mut closure: HashSet<&str> = HashSet::new();
        for id in &self.active {
            let mut current = self.tasks.get(id);
            while let Some(task) = current {
                if !closure.insert(task.id.as_str()) {
                    break;
                }
                current = task.parent_id.as_deref().and_then(|p| self.tasks.get(p));
            }
        }
        closure
    }

    /// Hierarchical listing filtered per node.
    pub fn list(&self, options: ListOptions) -> Vec<TreeRow<'_>> {
        let closure = (options.status == StatusFilter::Active).then(|| self.active_closure());

        let rows: Vec<TreeRow<'_>> = self
            .walk(options.sort)
            .into_iter()
            .filter(|(task, _)| match options.status {
                StatusFilter::Clean => task.clean,
                StatusFilter::Active => closure
                    .as_ref()
                    .is_some_and(|c| c.contains(task.id.as_str())),
                _ if task.clean && !options.include_clean => false,
                StatusFilter::All => true,
                StatusFilter::Incomplete => !task.completed,
                StatusFilter::Completed => task.completed,
            })
            .collect();

        debug!(?options, rows = rows.len(), "Listed tasks");
        rows
    }

    /// Tasks that can be taken: not completed, not clean, not already active.
    pub fn takeable(&self, sort: SortOrder) -> Vec<EligibleRow<'_>> {
        self.annotate(sort, |store, task| {
            !task.completed && !task.clean && !store.is_active(&task.id)
        })
    }

    /// Tasks that can be released: active and not clean.
    pub fn untakeable(&self, sort: SortOrder) -> Vec<EligibleRow<'_>> {
        self.annotate(sort, |store, task| store.is_active(&task.id) && !task.clean)
    }

    fn annotate<F>(&self, sort: SortOrder, eligible: F) -> Vec<EligibleRow<'_>>
    where
        F: Fn(&Self, &Task) -> bool,
    {
        self.list(ListOptions::default().sorted(sort))
            .into_iter()
            .map(|(task, depth)| (task, depth, eligible(self, task)))
            .collect()
    }
}
