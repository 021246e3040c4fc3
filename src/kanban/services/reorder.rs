//! Reorder transactions: the three move operations.
//!
//! Each operation is one logical unit of work — load the affected ordered
//! scopes, validate the intent, compute the full renumbered position sets,
//! and commit everything through the gateway as one atomic change set.
//! Structural validation failures reject before any write. A stale-snapshot
//! conflict retries the whole load–compute–commit cycle exactly once before
//! surfacing [`ReorderError::ReorderConflict`].
//!
//! The caller is trusted to have verified project access already.

use crate::kanban::domain::{
    position, status, BoardId, ColumnId, OrderedCollection, Position, Task, TaskId,
};
use crate::kanban::ports::{
    ChangeSet, ColumnPositionUpdate, GatewayError, OrderingSnapshot, PersistenceGateway,
    TaskMove, TaskPositionUpdate,
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Result type for reorder operations.
pub type ReorderResult<T> = Result<T, ReorderError>;

/// Errors returned by reorder operations.
#[derive(Debug, Clone, Error)]
pub enum ReorderError {
    /// The referenced task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The referenced column does not exist.
    #[error("column not found: {0}")]
    ColumnNotFound(ColumnId),

    /// The referenced board does not exist.
    #[error("board not found: {0}")]
    BoardNotFound(BoardId),

    /// The task is not currently in the named column.
    #[error("task {task} is not in column {column}")]
    TaskNotInColumn {
        /// The task named by the move intent.
        task: TaskId,
        /// The column the intent claimed as source.
        column: ColumnId,
    },

    /// Source and destination columns belong to different boards. Always
    /// rejected, never coerced.
    #[error("cannot move task {task} across boards (column {source_column} to {destination})")]
    CrossBoardMove {
        /// The task named by the move intent.
        task: TaskId,
        /// Source column.
        source_column: ColumnId,
        /// Destination column on a different board.
        destination: ColumnId,
    },

    /// A concurrent writer invalidated the ordering snapshot twice in a row.
    #[error("concurrent reorder invalidated the ordering snapshot")]
    ReorderConflict,

    /// The gateway failed; the transaction was rolled back in full.
    #[error(transparent)]
    Persistence(GatewayError),
}

/// The committed task order of one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnOrdering {
    /// The column scope.
    pub column_id: ColumnId,
    /// Task ids in committed position order.
    pub tasks: Vec<TaskId>,
}

/// The committed column order of one board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardOrdering {
    /// The board scope.
    pub board_id: BoardId,
    /// Column ids in committed position order.
    pub columns: Vec<ColumnId>,
}

/// Outcome of a cross-column move: the reconciled task plus both committed
/// orderings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossColumnMove {
    /// The moved task with its new column and reconciled status.
    pub task: Task,
    /// Source column ordering after removal.
    pub source: ColumnOrdering,
    /// Destination column ordering after insertion.
    pub destination: ColumnOrdering,
}

/// Reorder orchestration service.
///
/// The gateway and clock are injected, never looked up from ambient global
/// state, so the engine is unit-testable against an in-memory gateway.
pub struct ReorderService<G, C>
where
    G: PersistenceGateway,
    C: Clock + Send + Sync,
{
    gateway: Arc<G>,
    clock: Arc<C>,
}

// Manual impl: a derive would require `G: Clone` and `C: Clone`, but only the
// `Arc` handles are cloned.
impl<G, C> Clone for ReorderService<G, C>
where
    G: PersistenceGateway,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            clock: Arc::clone(&self.clock),
        }
    }
}

fn is_snapshot_conflict<T>(outcome: &ReorderResult<T>) -> bool {
    matches!(
        outcome,
        Err(ReorderError::Persistence(GatewayError::Conflict { .. }))
    )
}

impl<G, C> ReorderService<G, C>
where
    G: PersistenceGateway,
    C: Clock + Send + Sync,
{
    /// Creates a new reorder service.
    #[must_use]
    pub const fn new(gateway: Arc<G>, clock: Arc<C>) -> Self {
        Self { gateway, clock }
    }

    /// Moves a task to a new index within its current column.
    ///
    /// The target index is clamped to the column bounds. No status
    /// reconciliation happens; the column did not change.
    ///
    /// # Errors
    ///
    /// Returns [`ReorderError`] when the column or task cannot be resolved,
    /// when a concurrent reorder wins twice, or when the gateway fails.
    pub async fn move_task_within_column(
        &self,
        task_id: TaskId,
        column_id: ColumnId,
        target_index: usize,
    ) -> ReorderResult<ColumnOrdering> {
        let mut outcome = self
            .try_move_task_within_column(task_id, column_id, target_index)
            .await;
        if is_snapshot_conflict(&outcome) {
            debug!(%task_id, %column_id, "ordering snapshot went stale, retrying once");
            outcome = self
                .try_move_task_within_column(task_id, column_id, target_index)
                .await;
            if is_snapshot_conflict(&outcome) {
                return Err(ReorderError::ReorderConflict);
            }
        }
        outcome
    }

    /// Moves a task into another column of the same board at the given index.
    ///
    /// Both scopes are renumbered and committed together with the task's
    /// column reassignment and reconciled status; partial application is
    /// never observable.
    ///
    /// # Errors
    ///
    /// Returns [`ReorderError::CrossBoardMove`] when the columns span boards,
    /// [`ReorderError::TaskNotInColumn`] when the task is not in the claimed
    /// source, other [`ReorderError`] variants for missing entities,
    /// conflicts, and gateway failures.
    pub async fn move_task_across_columns(
        &self,
        task_id: TaskId,
        source_column_id: ColumnId,
        destination_column_id: ColumnId,
        target_index: usize,
    ) -> ReorderResult<CrossColumnMove> {
        let mut outcome = self
            .try_move_task_across_columns(
                task_id,
                source_column_id,
                destination_column_id,
                target_index,
            )
            .await;
        if is_snapshot_conflict(&outcome) {
            debug!(%task_id, "ordering snapshot went stale, retrying once");
            outcome = self
                .try_move_task_across_columns(
                    task_id,
                    source_column_id,
                    destination_column_id,
                    target_index,
                )
                .await;
            if is_snapshot_conflict(&outcome) {
                return Err(ReorderError::ReorderConflict);
            }
        }
        outcome
    }

    /// Moves a column to a new index within its board.
    ///
    /// # Errors
    ///
    /// Returns [`ReorderError`] when the board or column cannot be resolved,
    /// when a concurrent reorder wins twice, or when the gateway fails.
    pub async fn move_column(
        &self,
        board_id: BoardId,
        column_id: ColumnId,
        target_index: usize,
    ) -> ReorderResult<BoardOrdering> {
        let mut outcome = self.try_move_column(board_id, column_id, target_index).await;
        if is_snapshot_conflict(&outcome) {
            debug!(%board_id, %column_id, "ordering snapshot went stale, retrying once");
            outcome = self.try_move_column(board_id, column_id, target_index).await;
            if is_snapshot_conflict(&outcome) {
                return Err(ReorderError::ReorderConflict);
            }
        }
        outcome
    }

    async fn try_move_task_within_column(
        &self,
        task_id: TaskId,
        column_id: ColumnId,
        target_index: usize,
    ) -> ReorderResult<ColumnOrdering> {
        debug!(%task_id, %column_id, target_index, phase = "validating");
        if self
            .gateway
            .find_column(column_id)
            .await
            .map_err(ReorderError::Persistence)?
            .is_none()
        {
            return Err(ReorderError::ColumnNotFound(column_id));
        }
        let tasks = self
            .gateway
            .load_tasks_for_column(column_id)
            .await
            .map_err(ReorderError::Persistence)?;
        let scope = OrderedCollection::new(column_id, tasks);
        if !scope.contains(task_id) {
            return Err(ReorderError::TaskNotInColumn {
                task: task_id,
                column: column_id,
            });
        }

        let observed = scope.ids();
        let order = position::insert_at(&observed, task_id, target_index);
        let positions = position::renumber(&order);

        let changes = ChangeSet {
            snapshots: vec![OrderingSnapshot::ColumnTasks {
                column_id,
                observed,
            }],
            task_positions: vec![TaskPositionUpdate {
                column_id,
                positions,
            }],
            ..ChangeSet::default()
        };
        debug!(%task_id, %column_id, phase = "committing");
        self.gateway
            .commit(changes)
            .await
            .map_err(ReorderError::Persistence)?;
        debug!(%task_id, %column_id, phase = "committed");
        Ok(ColumnOrdering {
            column_id,
            tasks: order,
        })
    }

    async fn try_move_task_across_columns(
        &self,
        task_id: TaskId,
        source_column_id: ColumnId,
        destination_column_id: ColumnId,
        target_index: usize,
    ) -> ReorderResult<CrossColumnMove> {
        debug!(%task_id, %source_column_id, %destination_column_id, phase = "validating");
        let task = self
            .gateway
            .find_task(task_id)
            .await
            .map_err(ReorderError::Persistence)?
            .ok_or(ReorderError::TaskNotFound(task_id))?;
        let destination = self
            .gateway
            .find_column(destination_column_id)
            .await
            .map_err(ReorderError::Persistence)?
            .ok_or(ReorderError::ColumnNotFound(destination_column_id))?;
        let source = self
            .gateway
            .find_column(source_column_id)
            .await
            .map_err(ReorderError::Persistence)?
            .ok_or(ReorderError::ColumnNotFound(source_column_id))?;

        if source.board_id() != task.board_id() || destination.board_id() != task.board_id() {
            return Err(ReorderError::CrossBoardMove {
                task: task_id,
                source_column: source_column_id,
                destination: destination_column_id,
            });
        }
        if task.column_id() != source_column_id {
            return Err(ReorderError::TaskNotInColumn {
                task: task_id,
                column: source_column_id,
            });
        }

        let source_scope = OrderedCollection::new(
            source_column_id,
            self.gateway
                .load_tasks_for_column(source_column_id)
                .await
                .map_err(ReorderError::Persistence)?,
        );
        let destination_scope = OrderedCollection::new(
            destination_column_id,
            self.gateway
                .load_tasks_for_column(destination_column_id)
                .await
                .map_err(ReorderError::Persistence)?,
        );

        let source_observed = source_scope.ids();
        let destination_observed = destination_scope.ids();

        let source_order: Vec<TaskId> = source_observed
            .iter()
            .copied()
            .filter(|id| *id != task_id)
            .collect();
        let destination_order =
            position::insert_at(&destination_observed, task_id, target_index);
        let destination_positions = position::renumber(&destination_order);

        let moved_at = self.clock.utc();
        let mut moved = status::reconcile_task_status(task, &destination, moved_at);
        // Mirror the committed destination ordinal, so callers can reconcile
        // UI state to the returned task without a re-read.
        moved.set_position(
            destination_positions
                .get(&task_id)
                .copied()
                .unwrap_or(Position::ZERO),
        );

        let changes = ChangeSet {
            snapshots: vec![
                OrderingSnapshot::ColumnTasks {
                    column_id: source_column_id,
                    observed: source_observed,
                },
                OrderingSnapshot::ColumnTasks {
                    column_id: destination_column_id,
                    observed: destination_observed,
                },
            ],
            task_positions: vec![
                TaskPositionUpdate {
                    column_id: source_column_id,
                    positions: position::renumber(&source_order),
                },
                TaskPositionUpdate {
                    column_id: destination_column_id,
                    positions: destination_positions,
                },
            ],
            task_move: Some(TaskMove {
                task_id,
                destination: destination_column_id,
                status: moved.status(),
                moved_at,
            }),
            ..ChangeSet::default()
        };
        debug!(%task_id, %destination_column_id, phase = "committing");
        self.gateway
            .commit(changes)
            .await
            .map_err(ReorderError::Persistence)?;
        debug!(%task_id, %destination_column_id, phase = "committed");
        Ok(CrossColumnMove {
            task: moved,
            source: ColumnOrdering {
                column_id: source_column_id,
                tasks: source_order,
            },
            destination: ColumnOrdering {
                column_id: destination_column_id,
                tasks: destination_order,
            },
        })
    }

    async fn try_move_column(
        &self,
        board_id: BoardId,
        column_id: ColumnId,
        target_index: usize,
    ) -> ReorderResult<BoardOrdering> {
        debug!(%board_id, %column_id, target_index, phase = "validating");
        if self
            .gateway
            .find_board(board_id)
            .await
            .map_err(ReorderError::Persistence)?
            .is_none()
        {
            return Err(ReorderError::BoardNotFound(board_id));
        }
        let scope = OrderedCollection::new(
            board_id,
            self.gateway
                .load_columns_for_board(board_id)
                .await
                .map_err(ReorderError::Persistence)?,
        );
        if !scope.contains(column_id) {
            return Err(ReorderError::ColumnNotFound(column_id));
        }

        let observed = scope.ids();
        let order = position::insert_at(&observed, column_id, target_index);
        let positions = position::renumber(&order);

        let changes = ChangeSet {
            snapshots: vec![OrderingSnapshot::BoardColumns { board_id, observed }],
            column_positions: Some(ColumnPositionUpdate {
                board_id,
                positions,
            }),
            ..ChangeSet::default()
        };
        debug!(%board_id, %column_id, phase = "committing");
        self.gateway
            .commit(changes)
            .await
            .map_err(ReorderError::Persistence)?;
        debug!(%board_id, %column_id, phase = "committed");
        Ok(BoardOrdering {
            board_id,
            columns: order,
        })
    }
}
