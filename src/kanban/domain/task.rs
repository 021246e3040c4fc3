//! Task aggregate: an ordered child of exactly one column.

use super::{BoardId, ColumnId, KanbanDomainError, Ordered, ParseTaskPriorityError, Position,
            TaskId, TaskStatus};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Task urgency, orthogonal to workflow status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Can wait.
    Low,
    /// Normal urgency.
    #[default]
    Medium,
    /// Should be picked up soon.
    High,
    /// Drop everything.
    Urgent,
}

impl TaskPriority {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl TryFrom<&str> for TaskPriority {
    type Error = ParseTaskPriorityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(ParseTaskPriorityError(value.to_owned())),
        }
    }
}

/// A task card. Belongs to exactly one column at a time; `board_id` is
/// denormalized for lookup and cross-board validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    column_id: ColumnId,
    board_id: BoardId,
    title: String,
    status: TaskStatus,
    priority: TaskPriority,
    position: Position,
    assignees: Vec<String>,
    tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Current owning column.
    pub column_id: ColumnId,
    /// Denormalized board reference.
    pub board_id: BoardId,
    /// Display title.
    pub title: String,
    /// Explicit workflow status.
    pub status: TaskStatus,
    /// Urgency.
    pub priority: TaskPriority,
    /// Ordinal within the column.
    pub position: Position,
    /// Assignee handles; opaque to this core.
    pub assignees: Vec<String>,
    /// Tag labels; opaque to this core.
    pub tags: Vec<String>,
    /// Due date, if any; opaque to this core.
    pub due_date: Option<DateTime<Utc>>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest-change timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new task in the given column at the given position.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanDomainError::EmptyTaskTitle`] when the title is empty
    /// after trimming.
    pub fn new(
        board_id: BoardId,
        column_id: ColumnId,
        title: impl Into<String>,
        status: TaskStatus,
        priority: TaskPriority,
        position: Position,
        clock: &impl Clock,
    ) -> Result<Self, KanbanDomainError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(KanbanDomainError::EmptyTaskTitle);
        }
        let timestamp = clock.utc();
        Ok(Self {
            id: TaskId::new(),
            column_id,
            board_id,
            title,
            status,
            priority,
            position,
            assignees: Vec::new(),
            tags: Vec::new(),
            due_date: None,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            column_id: data.column_id,
            board_id: data.board_id,
            title: data.title,
            status: data.status,
            priority: data.priority,
            position: data.position,
            assignees: data.assignees,
            tags: data.tags,
            due_date: data.due_date,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Sets assignee handles.
    #[must_use]
    pub fn with_assignees(mut self, assignees: impl IntoIterator<Item = String>) -> Self {
        self.assignees = assignees.into_iter().collect();
        self
    }

    /// Sets tag labels.
    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.tags = tags.into_iter().collect();
        self
    }

    /// Sets the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the current owning column.
    #[must_use]
    pub const fn column_id(&self) -> ColumnId {
        self.column_id
    }

    /// Returns the denormalized board reference.
    #[must_use]
    pub const fn board_id(&self) -> BoardId {
        self.board_id
    }

    /// Returns the display title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the explicit workflow status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the urgency.
    #[must_use]
    pub const fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Returns the ordinal within the column.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Returns assignee handles.
    #[must_use]
    pub fn assignees(&self) -> &[String] {
        &self.assignees
    }

    /// Returns tag labels.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Returns the due date, if any.
    #[must_use]
    pub const fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest-change timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Overwrites the ordinal. Position changes are renumbering output and
    /// do not touch `updated_at`.
    pub const fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    /// Applies a committed move: retargets the owning column, overwrites the
    /// status, and stamps `updated_at`.
    ///
    /// Status reconciliation policy lives in
    /// [`status::reconcile_task_status`](super::status::reconcile_task_status);
    /// this method records its outcome.
    pub const fn apply_move(
        &mut self,
        destination: ColumnId,
        status: TaskStatus,
        at: DateTime<Utc>,
    ) {
        self.column_id = destination;
        self.status = status;
        self.updated_at = at;
    }

    /// Overwrites the explicit status and stamps `updated_at`.
    pub fn set_status(&mut self, status: TaskStatus, clock: &impl Clock) {
        self.status = status;
        self.updated_at = clock.utc();
    }
}

impl Ordered for Task {
    type Id = TaskId;

    fn id(&self) -> TaskId {
        self.id
    }

    fn position(&self) -> Position {
        self.position
    }
}
