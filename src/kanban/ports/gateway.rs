//! Persistence port: entity loading and atomic change-set commit.

use crate::kanban::domain::{Board, BoardId, Column, ColumnId, Position, Task, TaskId, TaskStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// A sibling scope whose ordering a transaction depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// The ordered columns of a board.
    BoardColumns(BoardId),
    /// The ordered tasks of a column.
    ColumnTasks(ColumnId),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BoardColumns(board_id) => write!(f, "columns of board {board_id}"),
            Self::ColumnTasks(column_id) => write!(f, "tasks of column {column_id}"),
        }
    }
}

/// The ordering a scope held when the transaction loaded it.
///
/// Commit verifies each snapshot against current storage and rejects the
/// whole change set with [`GatewayError::Conflict`] when a concurrent writer
/// has interleaved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderingSnapshot {
    /// Observed column order of a board.
    BoardColumns {
        /// The board whose columns were loaded.
        board_id: BoardId,
        /// Column ids in the loaded order.
        observed: Vec<ColumnId>,
    },
    /// Observed task order of a column.
    ColumnTasks {
        /// The column whose tasks were loaded.
        column_id: ColumnId,
        /// Task ids in the loaded order.
        observed: Vec<TaskId>,
    },
}

impl OrderingSnapshot {
    /// Returns the scope this snapshot covers.
    #[must_use]
    pub const fn scope(&self) -> Scope {
        match self {
            Self::BoardColumns { board_id, .. } => Scope::BoardColumns(*board_id),
            Self::ColumnTasks { column_id, .. } => Scope::ColumnTasks(*column_id),
        }
    }
}

/// Full renumbered column positions for one board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPositionUpdate {
    /// The board whose column scope was renumbered.
    pub board_id: BoardId,
    /// New position for every column in the scope.
    pub positions: HashMap<ColumnId, Position>,
}

/// Full renumbered task positions for one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPositionUpdate {
    /// The column whose task scope was renumbered.
    pub column_id: ColumnId,
    /// New position for every task in the scope.
    pub positions: HashMap<TaskId, Position>,
}

/// Reassignment of a task to a new column with its reconciled status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskMove {
    /// The task being moved.
    pub task_id: TaskId,
    /// The new owning column.
    pub destination: ColumnId,
    /// The task's status after reconciliation.
    pub status: TaskStatus,
    /// Timestamp recorded as the task's `updated_at`.
    pub moved_at: DateTime<Utc>,
}

/// One logical transaction's worth of writes, applied all-or-nothing.
///
/// Services assemble the full change set up front; adapters apply it inside
/// a single transaction boundary after verifying every snapshot. Partial
/// application is never observable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Optimistic-concurrency expectations for every scope written to.
    pub snapshots: Vec<OrderingSnapshot>,
    /// Renumbered column positions, at most one board per transaction.
    pub column_positions: Option<ColumnPositionUpdate>,
    /// Renumbered task positions; a cross-column move carries two entries.
    pub task_positions: Vec<TaskPositionUpdate>,
    /// Column reassignment of a moved task.
    pub task_move: Option<TaskMove>,
    /// A newly created column.
    pub insert_column: Option<Column>,
    /// A column to delete; its tasks are removed in the same transaction.
    pub remove_column: Option<ColumnId>,
    /// A newly created task.
    pub insert_task: Option<Task>,
    /// A task to delete.
    pub remove_task: Option<TaskId>,
}

/// Storage contract for the ordering engine.
///
/// Implementations must make [`commit`](PersistenceGateway::commit) atomic:
/// either every write in the change set becomes visible, or none does, and
/// stale snapshots abort before any write. Load results are sorted by
/// position.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Finds a board by id. Returns `None` when it does not exist.
    async fn find_board(&self, id: BoardId) -> GatewayResult<Option<Board>>;

    /// Finds a column by id. Returns `None` when it does not exist.
    async fn find_column(&self, id: ColumnId) -> GatewayResult<Option<Column>>;

    /// Finds a task by id. Returns `None` when it does not exist.
    async fn find_task(&self, id: TaskId) -> GatewayResult<Option<Task>>;

    /// Loads all columns of a board, sorted by position.
    async fn load_columns_for_board(&self, board_id: BoardId) -> GatewayResult<Vec<Column>>;

    /// Loads all tasks of a column, sorted by position.
    async fn load_tasks_for_column(&self, column_id: ColumnId) -> GatewayResult<Vec<Task>>;

    /// Applies the change set as one atomic unit.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Conflict`] when any snapshot no longer matches
    /// current storage (nothing is applied), or
    /// [`GatewayError::Backend`] when the underlying store fails (the
    /// transaction is rolled back in full).
    async fn commit(&self, changes: ChangeSet) -> GatewayResult<()>;
}

/// Errors returned by gateway implementations.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// A concurrent writer invalidated an ordering snapshot.
    #[error("stale ordering snapshot for {scope}")]
    Conflict {
        /// The scope whose observed ordering went stale.
        scope: Scope,
    },

    /// Persistence-layer failure; the transaction was rolled back.
    #[error("persistence error: {0}")]
    Backend(Arc<dyn std::error::Error + Send + Sync>),
}

impl GatewayError {
    /// Wraps a backend error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Arc::new(err))
    }
}
