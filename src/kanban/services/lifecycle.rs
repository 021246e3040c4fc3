//! Column and task lifecycle: create and delete with same-commit renumbering.
//!
//! Creation appends at the next free position; deletion renumbers the
//! surviving siblings inside the same change set, so the contiguity
//! invariant holds after every committed transaction. Like the reorder
//! operations, each commit carries the loaded ordering snapshot and retries
//! once when a concurrent writer interleaves.

use crate::kanban::domain::{
    position, status, BoardId, Column, ColumnId, KanbanDomainError, OrderedCollection, Position,
    StatusConflict, Task, TaskId, TaskPriority, TaskStatus,
};
use crate::kanban::ports::{
    ChangeSet, ColumnPositionUpdate, GatewayError, OrderingSnapshot, PersistenceGateway,
    TaskPositionUpdate,
};
use crate::kanban::services::{BoardOrdering, ColumnOrdering};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Result type for lifecycle operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Errors returned by lifecycle operations.
#[derive(Debug, Clone, Error)]
pub enum LifecycleError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] KanbanDomainError),

    /// The referenced board does not exist.
    #[error("board not found: {0}")]
    BoardNotFound(BoardId),

    /// The referenced column does not exist.
    #[error("column not found: {0}")]
    ColumnNotFound(ColumnId),

    /// The referenced task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// A concurrent writer invalidated the ordering snapshot twice in a row.
    #[error("concurrent write invalidated the ordering snapshot")]
    Conflict,

    /// The gateway failed; the transaction was rolled back.
    #[error(transparent)]
    Persistence(GatewayError),
}

fn is_snapshot_conflict<T>(outcome: &LifecycleResult<T>) -> bool {
    matches!(
        outcome,
        Err(LifecycleError::Persistence(GatewayError::Conflict { .. }))
    )
}

/// Column and task lifecycle orchestration service.
pub struct BoardLifecycleService<G, C>
where
    G: PersistenceGateway,
    C: Clock + Send + Sync,
{
    gateway: Arc<G>,
    clock: Arc<C>,
}

// Manual impl: a derive would require `G: Clone` and `C: Clone`, but only the
// `Arc` handles are cloned.
impl<G, C> Clone for BoardLifecycleService<G, C>
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

impl<G, C> BoardLifecycleService<G, C>
where
    G: PersistenceGateway,
    C: Clock + Send + Sync,
{
    /// Creates a new lifecycle service.
    #[must_use]
    pub const fn new(gateway: Arc<G>, clock: Arc<C>) -> Self {
        Self { gateway, clock }
    }

    /// Creates a column appended at the board's next free position.
    ///
    /// Status-uniqueness conflicts on the board are returned alongside the
    /// column and logged; the write proceeds (default policy — the caller
    /// may reject instead).
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError`] when the board is missing, the title is
    /// empty, or persistence fails.
    pub async fn add_column(
        &self,
        board_id: BoardId,
        title: &str,
        column_status: Option<TaskStatus>,
        color: Option<String>,
    ) -> LifecycleResult<(Column, Vec<StatusConflict>)> {
        let mut outcome = self
            .try_add_column(board_id, title, column_status, color.clone())
            .await;
        if is_snapshot_conflict(&outcome) {
            outcome = self
                .try_add_column(board_id, title, column_status, color)
                .await;
            if is_snapshot_conflict(&outcome) {
                return Err(LifecycleError::Conflict);
            }
        }
        outcome
    }

    /// Deletes a column and renumbers the board's surviving columns in the
    /// same transaction. The column's tasks are removed with it.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError`] when the board or column is missing or
    /// persistence fails.
    pub async fn delete_column(
        &self,
        board_id: BoardId,
        column_id: ColumnId,
    ) -> LifecycleResult<BoardOrdering> {
        let mut outcome = self.try_delete_column(board_id, column_id).await;
        if is_snapshot_conflict(&outcome) {
            outcome = self.try_delete_column(board_id, column_id).await;
            if is_snapshot_conflict(&outcome) {
                return Err(LifecycleError::Conflict);
            }
        }
        outcome
    }

    /// Creates a task in the given column, appended by default or spliced at
    /// an explicit index with a full renumber.
    ///
    /// The task's initial status is the column's derivable status, falling
    /// back to [`TaskStatus::Todo`].
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError`] when the column is missing, the title is
    /// empty, or persistence fails.
    pub async fn add_task(
        &self,
        column_id: ColumnId,
        title: &str,
        priority: TaskPriority,
        target_index: Option<usize>,
    ) -> LifecycleResult<Task> {
        let mut outcome = self
            .try_add_task(column_id, title, priority, target_index)
            .await;
        if is_snapshot_conflict(&outcome) {
            outcome = self
                .try_add_task(column_id, title, priority, target_index)
                .await;
            if is_snapshot_conflict(&outcome) {
                return Err(LifecycleError::Conflict);
            }
        }
        outcome
    }

    /// Deletes a task and renumbers the owning column's surviving tasks in
    /// the same transaction.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::TaskNotFound`] when the task is missing, or
    /// a persistence error.
    pub async fn delete_task(&self, task_id: TaskId) -> LifecycleResult<ColumnOrdering> {
        let mut outcome = self.try_delete_task(task_id).await;
        if is_snapshot_conflict(&outcome) {
            outcome = self.try_delete_task(task_id).await;
            if is_snapshot_conflict(&outcome) {
                return Err(LifecycleError::Conflict);
            }
        }
        outcome
    }

    async fn try_add_column(
        &self,
        board_id: BoardId,
        title: &str,
        column_status: Option<TaskStatus>,
        color: Option<String>,
    ) -> LifecycleResult<(Column, Vec<StatusConflict>)> {
        if self
            .gateway
            .find_board(board_id)
            .await
            .map_err(LifecycleError::Persistence)?
            .is_none()
        {
            return Err(LifecycleError::BoardNotFound(board_id));
        }
        let existing = self
            .gateway
            .load_columns_for_board(board_id)
            .await
            .map_err(LifecycleError::Persistence)?;
        let positions: Vec<Position> = existing.iter().map(Column::position).collect();
        let column = Column::new(
            board_id,
            title,
            column_status,
            color,
            position::append_position(&positions),
            &*self.clock,
        )?;

        let mut board_columns = existing.clone();
        board_columns.push(column.clone());
        let conflicts = status::validate_column_status_uniqueness(&board_columns);
        for conflict in &conflicts {
            warn!(
                %board_id,
                status = conflict.status.as_str(),
                columns = ?conflict.column_ids,
                "multiple columns claim the same canonical status"
            );
        }

        let scope = OrderedCollection::new(board_id, existing);
        let changes = ChangeSet {
            snapshots: vec![OrderingSnapshot::BoardColumns {
                board_id,
                observed: scope.ids(),
            }],
            insert_column: Some(column.clone()),
            ..ChangeSet::default()
        };
        self.gateway
            .commit(changes)
            .await
            .map_err(LifecycleError::Persistence)?;
        Ok((column, conflicts))
    }

    async fn try_delete_column(
        &self,
        board_id: BoardId,
        column_id: ColumnId,
    ) -> LifecycleResult<BoardOrdering> {
        let scope = OrderedCollection::new(
            board_id,
            self.gateway
                .load_columns_for_board(board_id)
                .await
                .map_err(LifecycleError::Persistence)?,
        );
        if !scope.contains(column_id) {
            return Err(LifecycleError::ColumnNotFound(column_id));
        }
        let observed = scope.ids();
        let order: Vec<ColumnId> = observed
            .iter()
            .copied()
            .filter(|id| *id != column_id)
            .collect();

        let changes = ChangeSet {
            snapshots: vec![OrderingSnapshot::BoardColumns { board_id, observed }],
            remove_column: Some(column_id),
            column_positions: Some(ColumnPositionUpdate {
                board_id,
                positions: position::renumber(&order),
            }),
            ..ChangeSet::default()
        };
        self.gateway
            .commit(changes)
            .await
            .map_err(LifecycleError::Persistence)?;
        Ok(BoardOrdering {
            board_id,
            columns: order,
        })
    }

    async fn try_add_task(
        &self,
        column_id: ColumnId,
        title: &str,
        priority: TaskPriority,
        target_index: Option<usize>,
    ) -> LifecycleResult<Task> {
        let column = self
            .gateway
            .find_column(column_id)
            .await
            .map_err(LifecycleError::Persistence)?
            .ok_or(LifecycleError::ColumnNotFound(column_id))?;
        let scope = OrderedCollection::new(
            column_id,
            self.gateway
                .load_tasks_for_column(column_id)
                .await
                .map_err(LifecycleError::Persistence)?,
        );
        let observed = scope.ids();
        let initial_status = status::status_for_column(&column);

        let mut task = Task::new(
            column.board_id(),
            column_id,
            title,
            initial_status,
            priority,
            Position::ZERO,
            &*self.clock,
        )?;

        let mut changes = ChangeSet {
            snapshots: vec![OrderingSnapshot::ColumnTasks {
                column_id,
                observed: observed.clone(),
            }],
            ..ChangeSet::default()
        };

        match target_index {
            None => {
                let positions: Vec<Position> =
                    scope.items().iter().map(Task::position).collect();
                task.set_position(position::append_position(&positions));
            }
            Some(index) => {
                let order = position::insert_at(&observed, task.id(), index);
                let positions = position::renumber(&order);
                task.set_position(
                    positions.get(&task.id()).copied().unwrap_or(Position::ZERO),
                );
                changes.task_positions = vec![TaskPositionUpdate {
                    column_id,
                    positions,
                }];
            }
        }

        changes.insert_task = Some(task.clone());
        self.gateway
            .commit(changes)
            .await
            .map_err(LifecycleError::Persistence)?;
        Ok(task)
    }

    async fn try_delete_task(&self, task_id: TaskId) -> LifecycleResult<ColumnOrdering> {
        let task = self
            .gateway
            .find_task(task_id)
            .await
            .map_err(LifecycleError::Persistence)?
            .ok_or(LifecycleError::TaskNotFound(task_id))?;
        let column_id = task.column_id();
        let scope = OrderedCollection::new(
            column_id,
            self.gateway
                .load_tasks_for_column(column_id)
                .await
                .map_err(LifecycleError::Persistence)?,
        );
        let observed = scope.ids();
        let order: Vec<TaskId> = observed
            .iter()
            .copied()
            .filter(|id| *id != task_id)
            .collect();

        let changes = ChangeSet {
            snapshots: vec![OrderingSnapshot::ColumnTasks {
                column_id,
                observed,
            }],
            remove_task: Some(task_id),
            task_positions: vec![TaskPositionUpdate {
                column_id,
                positions: position::renumber(&order),
            }],
            ..ChangeSet::default()
        };
        self.gateway
            .commit(changes)
            .await
            .map_err(LifecycleError::Persistence)?;
        Ok(ColumnOrdering {
            column_id,
            tasks: order,
        })
    }
}
