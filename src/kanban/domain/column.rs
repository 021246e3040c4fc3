//! Column aggregate: an ordered child of a board, owner of an ordered task
//! scope.

use super::{BoardId, ColumnId, KanbanDomainError, Ordered, Position, TaskStatus};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// A column within a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    id: ColumnId,
    board_id: BoardId,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    position: Position,
    is_collapsed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedColumnData {
    /// Persisted column identifier.
    pub id: ColumnId,
    /// Owning board.
    pub board_id: BoardId,
    /// Display title.
    pub title: String,
    /// Explicit status tag, if any.
    pub status: Option<TaskStatus>,
    /// Opaque display colour, if any.
    pub color: Option<String>,
    /// Ordinal within the board.
    pub position: Position,
    /// Whether the column is collapsed in the UI.
    pub is_collapsed: bool,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest-change timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Column {
    /// Creates a new column at the given position.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanDomainError::EmptyColumnTitle`] when the title is
    /// empty after trimming.
    pub fn new(
        board_id: BoardId,
        title: impl Into<String>,
        status: Option<TaskStatus>,
        color: Option<String>,
        position: Position,
        clock: &impl Clock,
    ) -> Result<Self, KanbanDomainError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(KanbanDomainError::EmptyColumnTitle);
        }
        let timestamp = clock.utc();
        Ok(Self {
            id: ColumnId::new(),
            board_id,
            title,
            status,
            color,
            position,
            is_collapsed: false,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a column from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedColumnData) -> Self {
        Self {
            id: data.id,
            board_id: data.board_id,
            title: data.title,
            status: data.status,
            color: data.color,
            position: data.position,
            is_collapsed: data.is_collapsed,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the column identifier.
    #[must_use]
    pub const fn id(&self) -> ColumnId {
        self.id
    }

    /// Returns the owning board identifier.
    #[must_use]
    pub const fn board_id(&self) -> BoardId {
        self.board_id
    }

    /// Returns the display title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the explicit status tag, if any.
    #[must_use]
    pub const fn status(&self) -> Option<TaskStatus> {
        self.status
    }

    /// Returns the opaque display colour, if any.
    #[must_use]
    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    /// Returns the ordinal within the board.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Returns whether the column is collapsed in the UI.
    #[must_use]
    pub const fn is_collapsed(&self) -> bool {
        self.is_collapsed
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

    /// Sets the collapsed flag.
    pub fn set_collapsed(&mut self, collapsed: bool, clock: &impl Clock) {
        self.is_collapsed = collapsed;
        self.updated_at = clock.utc();
    }
}

impl Ordered for Column {
    type Id = ColumnId;

    fn id(&self) -> ColumnId {
        self.id
    }

    fn position(&self) -> Position {
        self.position
    }
}
