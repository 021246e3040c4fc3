//! Error types for domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KanbanDomainError {
    /// The board name is empty after trimming.
    #[error("board name must not be empty")]
    EmptyBoardName,

    /// The column title is empty after trimming.
    #[error("column title must not be empty")]
    EmptyColumnTitle,

    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTaskTitle,
}

/// Error returned while parsing task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing task priorities from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task priority: {0}")]
pub struct ParseTaskPriorityError(pub String);
