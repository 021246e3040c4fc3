//! Thread-safe in-memory persistence gateway.
//!
//! Commit verifies snapshots and applies every write under a single write
//! guard, which makes the change set atomic by construction and serializes
//! racing writers on the whole store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::kanban::domain::{Board, BoardId, Column, ColumnId, Ordered, Task, TaskId};
use crate::kanban::ports::{
    ChangeSet, GatewayError, GatewayResult, OrderingSnapshot, PersistenceGateway,
};

/// In-memory gateway backed by `Arc<RwLock<..>>` state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGateway {
    state: Arc<RwLock<InMemoryState>>,
}

#[derive(Debug, Default)]
struct InMemoryState {
    boards: HashMap<BoardId, Board>,
    columns: HashMap<ColumnId, Column>,
    tasks: HashMap<TaskId, Task>,
    fail_next_commit: bool,
}

impl InMemoryGateway {
    /// Creates an empty in-memory gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a board directly. Board CRUD is outside the ordering engine, so
    /// tests provision boards through this helper rather than the change set.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Backend`] when the state lock is poisoned.
    pub fn seed_board(&self, board: Board) -> GatewayResult<()> {
        let mut state = lock_write(&self.state)?;
        state.boards.insert(board.id(), board);
        Ok(())
    }

    /// Makes the next commit fail with a backend error before any write is
    /// applied. Test hook for atomicity checks.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Backend`] when the state lock is poisoned.
    pub fn fail_next_commit(&self) -> GatewayResult<()> {
        let mut state = lock_write(&self.state)?;
        state.fail_next_commit = true;
        Ok(())
    }
}

fn lock_write(
    state: &Arc<RwLock<InMemoryState>>,
) -> GatewayResult<std::sync::RwLockWriteGuard<'_, InMemoryState>> {
    state
        .write()
        .map_err(|err| GatewayError::backend(std::io::Error::other(err.to_string())))
}

fn lock_read(
    state: &Arc<RwLock<InMemoryState>>,
) -> GatewayResult<std::sync::RwLockReadGuard<'_, InMemoryState>> {
    state
        .read()
        .map_err(|err| GatewayError::backend(std::io::Error::other(err.to_string())))
}

fn column_order(state: &InMemoryState, board_id: BoardId) -> Vec<ColumnId> {
    let mut columns: Vec<&Column> = state
        .columns
        .values()
        .filter(|column| column.board_id() == board_id)
        .collect();
    columns.sort_by_key(|column| column.position());
    columns.iter().map(|column| column.id()).collect()
}

fn task_order(state: &InMemoryState, column_id: ColumnId) -> Vec<TaskId> {
    let mut tasks: Vec<&Task> = state
        .tasks
        .values()
        .filter(|task| task.column_id() == column_id)
        .collect();
    tasks.sort_by_key(|task| Ordered::position(*task));
    tasks.iter().map(|task| task.id()).collect()
}

fn verify_snapshots(state: &InMemoryState, changes: &ChangeSet) -> GatewayResult<()> {
    for snapshot in &changes.snapshots {
        let matches = match snapshot {
            OrderingSnapshot::BoardColumns { board_id, observed } => {
                column_order(state, *board_id) == *observed
            }
            OrderingSnapshot::ColumnTasks {
                column_id,
                observed,
            } => task_order(state, *column_id) == *observed,
        };
        if !matches {
            return Err(GatewayError::Conflict {
                scope: snapshot.scope(),
            });
        }
    }
    Ok(())
}

fn apply_changes(state: &mut InMemoryState, changes: ChangeSet) {
    if let Some(task_id) = changes.remove_task {
        state.tasks.remove(&task_id);
    }
    if let Some(column_id) = changes.remove_column {
        state.columns.remove(&column_id);
        state.tasks.retain(|_, task| task.column_id() != column_id);
    }
    if let Some(column) = changes.insert_column {
        state.columns.insert(column.id(), column);
    }
    if let Some(task) = changes.insert_task {
        state.tasks.insert(task.id(), task);
    }
    if let Some(task_move) = changes.task_move {
        if let Some(task) = state.tasks.get_mut(&task_move.task_id) {
            task.apply_move(task_move.destination, task_move.status, task_move.moved_at);
        }
    }
    if let Some(update) = changes.column_positions {
        for (column_id, position) in update.positions {
            if let Some(column) = state.columns.get_mut(&column_id) {
                column.set_position(position);
            }
        }
    }
    for update in changes.task_positions {
        for (task_id, position) in update.positions {
            if let Some(task) = state.tasks.get_mut(&task_id) {
                task.set_position(position);
            }
        }
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryGateway {
    async fn find_board(&self, id: BoardId) -> GatewayResult<Option<Board>> {
        let state = lock_read(&self.state)?;
        Ok(state.boards.get(&id).cloned())
    }

    async fn find_column(&self, id: ColumnId) -> GatewayResult<Option<Column>> {
        let state = lock_read(&self.state)?;
        Ok(state.columns.get(&id).cloned())
    }

    async fn find_task(&self, id: TaskId) -> GatewayResult<Option<Task>> {
        let state = lock_read(&self.state)?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn load_columns_for_board(&self, board_id: BoardId) -> GatewayResult<Vec<Column>> {
        let state = lock_read(&self.state)?;
        let mut columns: Vec<Column> = state
            .columns
            .values()
            .filter(|column| column.board_id() == board_id)
            .cloned()
            .collect();
        columns.sort_by_key(Column::position);
        Ok(columns)
    }

    async fn load_tasks_for_column(&self, column_id: ColumnId) -> GatewayResult<Vec<Task>> {
        let state = lock_read(&self.state)?;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| task.column_id() == column_id)
            .cloned()
            .collect();
        tasks.sort_by_key(Task::position);
        Ok(tasks)
    }

    async fn commit(&self, changes: ChangeSet) -> GatewayResult<()> {
        let mut state = lock_write(&self.state)?;
        if state.fail_next_commit {
            state.fail_next_commit = false;
            return Err(GatewayError::backend(std::io::Error::other(
                "injected commit failure",
            )));
        }
        verify_snapshots(&state, &changes)?;
        apply_changes(&mut state, changes);
        Ok(())
    }
}
