//! Canonical task statuses and the column-to-status mapping.
//!
//! A column's status is derived from its explicit status tag when present,
//! otherwise from an ordered substring table matched against the column
//! title. The table is a first-class artefact: its precedence (backlog →
//! todo → in progress → review → done) is auditable and independently
//! testable rather than buried in conditionals.

use super::{Column, ColumnId, ParseTaskStatusError, Task};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Canonical workflow status of a task.
///
/// Variant order is the heuristic matching priority.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not yet scheduled.
    Backlog,
    /// Scheduled, work not started.
    Todo,
    /// Being worked on.
    InProgress,
    /// Awaiting review.
    Review,
    /// Finished.
    Done,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Review => "review",
            Self::Done => "done",
        }
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "backlog" => Ok(Self::Backlog),
            "todo" => Ok(Self::Todo),
            "in_progress" => Ok(Self::InProgress),
            "review" => Ok(Self::Review),
            "done" => Ok(Self::Done),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Ordered title-substring fallback rules for columns without an explicit
/// status tag.
///
/// Matched case-insensitively against the column title; the first match in
/// table order wins. Russian synonyms cover legacy data created before
/// explicit status tags existed. Same title always yields the same status.
pub const TITLE_RULES: &[(&str, TaskStatus)] = &[
    ("backlog", TaskStatus::Backlog),
    ("бэклог", TaskStatus::Backlog),
    ("todo", TaskStatus::Todo),
    ("to do", TaskStatus::Todo),
    ("к выполнению", TaskStatus::Todo),
    ("in progress", TaskStatus::InProgress),
    ("progress", TaskStatus::InProgress),
    ("doing", TaskStatus::InProgress),
    ("в работе", TaskStatus::InProgress),
    ("review", TaskStatus::Review),
    ("ревью", TaskStatus::Review),
    ("проверк", TaskStatus::Review),
    ("done", TaskStatus::Done),
    ("готово", TaskStatus::Done),
    ("выполнено", TaskStatus::Done),
    ("завершен", TaskStatus::Done),
];

/// Returns the status derivable from a column: its explicit tag when set,
/// otherwise the first [`TITLE_RULES`] match against its title.
///
/// Returns `None` for a custom column with no tag and no recognised title;
/// such columns leave task statuses untouched on move.
#[must_use]
pub fn derived_status(column: &Column) -> Option<TaskStatus> {
    column.status().or_else(|| {
        let title = column.title().to_lowercase();
        TITLE_RULES
            .iter()
            .find(|(needle, _)| title.contains(needle))
            .map(|(_, status)| *status)
    })
}

/// Returns the status for a column, defaulting to [`TaskStatus::Todo`] when
/// nothing is derivable (legacy-data fallback).
#[must_use]
pub fn status_for_column(column: &Column) -> TaskStatus {
    derived_status(column).unwrap_or(TaskStatus::Todo)
}

/// Applies a move to `destination`: the task's explicit status is overwritten
/// with the destination's derivable status, or left untouched when the
/// destination has none.
#[must_use]
pub fn reconcile_task_status(mut task: Task, destination: &Column, moved_at: DateTime<Utc>) -> Task {
    let status = derived_status(destination).unwrap_or_else(|| task.status());
    task.apply_move(destination.id(), status, moved_at);
    task
}

/// A canonical status claimed by more than one column on the same board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusConflict {
    /// The contested status.
    pub status: TaskStatus,
    /// Every column on the board resolving to that status.
    pub column_ids: Vec<ColumnId>,
}

/// Reports each canonical status claimed by more than one of the given
/// columns. Derived statuses count: an explicit `review` tag conflicts with a
/// title that heuristically maps to review.
///
/// Never auto-fixes; the caller decides whether to reject the write or
/// proceed and surface a warning.
#[must_use]
pub fn validate_column_status_uniqueness(columns: &[Column]) -> Vec<StatusConflict> {
    let mut claims: BTreeMap<TaskStatus, Vec<ColumnId>> = BTreeMap::new();
    for column in columns {
        if let Some(status) = derived_status(column) {
            claims.entry(status).or_default().push(column.id());
        }
    }
    claims
        .into_iter()
        .filter(|(_, column_ids)| column_ids.len() > 1)
        .map(|(status, column_ids)| StatusConflict { status, column_ids })
        .collect()
}
