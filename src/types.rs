//! Core types for planit.

use crate::clock::{Timestamp, epoch};
use crate::error::{PlanitError, PlanitResult};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// A task in the project hierarchy.
///
/// Parent/child links are ids resolved through the store; a task owns its
/// `subtasks` membership list but not the children themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Child ids in display order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub subtasks: Vec<String>,
    #[serde(default = "epoch", with = "timestamp")]
    pub created_at: Timestamp,
    #[serde(default = "epoch", with = "timestamp")]
    pub updated_at: Timestamp,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed: bool,
    #[serde(default, with = "timestamp::option")]
    pub completed_at: Option<Timestamp>,
    /// Archived: frozen membership, not activatable, hidden by default.
    #[serde(default, deserialize_with = "null_as_default")]
    pub clean: bool,
    #[serde(default, with = "timestamp::option")]
    pub cleaned_at: Option<Timestamp>,
}

impl Task {
    /// Build a new task with a fresh id. The title must not be blank.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        parent_id: Option<String>,
        now: Timestamp,
    ) -> PlanitResult<Self> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(PlanitError::validation("Task title cannot be empty"));
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            title,
            description: description.into(),
            parent_id,
            subtasks: Vec::new(),
            created_at: now,
            updated_at: now,
            completed: false,
            completed_at: None,
            clean: false,
            cleaned_at: None,
        })
    }

    /// Append a child id. Clean tasks refuse new children; repeated ids are ignored.
    pub fn add_subtask(&mut self, child_id: &str, now: Timestamp) -> PlanitResult<()> {
        if self.clean {
            return Err(PlanitError::invalid_operation(format!(
                "Cannot add subtasks to clean task '{}'",
                self.title
            )));
        }
        if !self.subtasks.iter().any(|id| id == child_id) {
            self.subtasks.push(child_id.to_string());
        }
        self.updated_at = now;
        Ok(())
    }

    /// Drop a child id from the membership list. Returns whether it was present.
    pub fn remove_subtask(&mut self, child_id: &str, now: Timestamp) -> bool {
        let before = self.subtasks.len();
        self.subtasks.retain(|id| id != child_id);
        let removed = self.subtasks.len() != before;
        if removed {
            self.updated_at = now;
        }
        removed
    }

    pub fn mark_completed(&mut self, now: Timestamp) {
        self.completed = true;
        self.completed_at = Some(now);
        self.updated_at = now;
    }

    pub fn mark_uncompleted(&mut self, now: Timestamp) {
        self.completed = false;
        self.completed_at = None;
        self.updated_at = now;
    }

    pub fn mark_clean(&mut self, now: Timestamp) {
        self.clean = true;
        self.cleaned_at = Some(now);
        self.updated_at = now;
    }

    pub fn mark_unclean(&mut self, now: Timestamp) {
        self.clean = false;
        self.cleaned_at = None;
        self.updated_at = now;
    }

    /// The timestamp that best describes where the task is in its lifecycle.
    pub fn lifecycle_timestamp(&self) -> Timestamp {
        if self.clean {
            self.cleaned_at.unwrap_or_else(epoch)
        } else if self.completed {
            self.completed_at.unwrap_or_else(epoch)
        } else {
            self.created_at
        }
    }

    pub fn has_description(&self) -> bool {
        !self.description.trim().is_empty()
    }
}

/// Read an explicit `null` the same way as a missing field.
pub(crate) fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Option::unwrap_or_default)
}

/// Serde helpers for timestamps.
///
/// Writes RFC 3339 in UTC. Reads RFC 3339 or offset-less ISO-8601 (taken as
/// UTC); a null value falls back to the epoch.
pub(crate) mod timestamp {
    use crate::clock::{Timestamp, epoch};
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Result<Timestamp, String> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|e| format!("invalid timestamp '{}': {}", raw, e))
    }

    pub fn format(ts: &Timestamp) -> String {
        ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    pub fn serialize<S: Serializer>(ts: &Timestamp, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Timestamp, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(raw) => parse(&raw).map_err(D::Error::custom),
            None => Ok(epoch()),
        }
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(ts: &Option<Timestamp>, s: S) -> Result<S::Ok, S::Error> {
            match ts {
                Some(ts) => s.serialize_some(&format(ts)),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<Timestamp>, D::Error> {
            Option::<String>::deserialize(d)?
                .map(|raw| parse(&raw).map_err(D::Error::custom))
                .transpose()
        }
    }
}
