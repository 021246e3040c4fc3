//! Board aggregate root.

use super::{BoardId, KanbanDomainError};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// A board: the parent scope of an ordered set of columns.
///
/// The board owns its columns' membership through the persistence gateway;
/// it carries no column list in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    id: BoardId,
    name: String,
    created_at: DateTime<Utc>,
}

impl Board {
    /// Creates a new board.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanDomainError::EmptyBoardName`] when the name is empty
    /// after trimming.
    pub fn new(name: impl Into<String>, clock: &impl Clock) -> Result<Self, KanbanDomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(KanbanDomainError::EmptyBoardName);
        }
        Ok(Self {
            id: BoardId::new(),
            name,
            created_at: clock.utc(),
        })
    }

    /// Reconstructs a board from persisted storage.
    #[must_use]
    pub const fn from_persisted(id: BoardId, name: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            created_at,
        }
    }

    /// Returns the board identifier.
    #[must_use]
    pub const fn id(&self) -> BoardId {
        self.id
    }

    /// Returns the board name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
