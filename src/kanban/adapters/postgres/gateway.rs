//! `PostgreSQL` persistence gateway.
//!
//! Commit runs inside one Diesel transaction: every snapshot scope is
//! re-selected and compared before any write, so a concurrent reorder aborts
//! the whole change set with a conflict and the transaction rolls back.

use super::models::{
    column_to_row, position_to_db, row_to_board, row_to_column, row_to_task, task_to_row,
    BoardRow, ColumnRow, TaskRow,
};
use super::schema::{boards, columns, tasks};
use crate::kanban::domain::{Board, BoardId, Column, ColumnId, Task, TaskId};
use crate::kanban::ports::{
    ChangeSet, GatewayError, GatewayResult, OrderingSnapshot, PersistenceGateway, Scope,
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::Error as DieselError;

/// `PostgreSQL` connection pool type used by the ordering gateway.
pub type KanbanPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed persistence gateway.
#[derive(Debug, Clone)]
pub struct PostgresGateway {
    pool: KanbanPgPool,
}

/// Error carried through the commit transaction so a snapshot conflict can
/// abort it distinctly from a database failure.
#[derive(Debug)]
enum CommitError {
    Conflict(Scope),
    Backend(GatewayError),
}

impl From<DieselError> for CommitError {
    fn from(err: DieselError) -> Self {
        Self::Backend(GatewayError::backend(err))
    }
}

impl From<CommitError> for GatewayError {
    fn from(err: CommitError) -> Self {
        match err {
            CommitError::Conflict(scope) => Self::Conflict { scope },
            CommitError::Backend(gateway_err) => gateway_err,
        }
    }
}

impl PostgresGateway {
    /// Creates a new gateway from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: KanbanPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> GatewayResult<T>
    where
        F: FnOnce(&mut PgConnection) -> GatewayResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(GatewayError::backend)?;
            f(&mut connection)
        })
        .await
        .map_err(GatewayError::backend)?
    }
}

fn current_column_order(
    connection: &mut PgConnection,
    board_id: BoardId,
) -> Result<Vec<ColumnId>, CommitError> {
    let ids: Vec<uuid::Uuid> = columns::table
        .filter(columns::board_id.eq(board_id.into_inner()))
        .order(columns::position.asc())
        .select(columns::id)
        .load(connection)?;
    Ok(ids.into_iter().map(ColumnId::from_uuid).collect())
}

fn current_task_order(
    connection: &mut PgConnection,
    column_id: ColumnId,
) -> Result<Vec<TaskId>, CommitError> {
    let ids: Vec<uuid::Uuid> = tasks::table
        .filter(tasks::column_id.eq(column_id.into_inner()))
        .order(tasks::position.asc())
        .select(tasks::id)
        .load(connection)?;
    Ok(ids.into_iter().map(TaskId::from_uuid).collect())
}

fn verify_snapshots(
    connection: &mut PgConnection,
    changes: &ChangeSet,
) -> Result<(), CommitError> {
    for snapshot in &changes.snapshots {
        let matches = match snapshot {
            OrderingSnapshot::BoardColumns { board_id, observed } => {
                current_column_order(connection, *board_id)? == *observed
            }
            OrderingSnapshot::ColumnTasks {
                column_id,
                observed,
            } => current_task_order(connection, *column_id)? == *observed,
        };
        if !matches {
            return Err(CommitError::Conflict(snapshot.scope()));
        }
    }
    Ok(())
}

fn apply_changes(connection: &mut PgConnection, changes: ChangeSet) -> Result<(), CommitError> {
    if let Some(task_id) = changes.remove_task {
        diesel::delete(tasks::table.filter(tasks::id.eq(task_id.into_inner())))
            .execute(connection)?;
    }
    if let Some(column_id) = changes.remove_column {
        diesel::delete(tasks::table.filter(tasks::column_id.eq(column_id.into_inner())))
            .execute(connection)?;
        diesel::delete(columns::table.filter(columns::id.eq(column_id.into_inner())))
            .execute(connection)?;
    }
    if let Some(ref column) = changes.insert_column {
        diesel::insert_into(columns::table)
            .values(column_to_row(column))
            .execute(connection)?;
    }
    if let Some(ref task) = changes.insert_task {
        diesel::insert_into(tasks::table)
            .values(task_to_row(task))
            .execute(connection)?;
    }
    if let Some(task_move) = changes.task_move {
        diesel::update(tasks::table.filter(tasks::id.eq(task_move.task_id.into_inner())))
            .set((
                tasks::column_id.eq(task_move.destination.into_inner()),
                tasks::status.eq(task_move.status.as_str()),
                tasks::updated_at.eq(task_move.moved_at),
            ))
            .execute(connection)?;
    }
    if let Some(update) = changes.column_positions {
        for (column_id, position) in update.positions {
            diesel::update(columns::table.filter(columns::id.eq(column_id.into_inner())))
                .set(columns::position.eq(position_to_db(position)))
                .execute(connection)?;
        }
    }
    for update in changes.task_positions {
        for (task_id, position) in update.positions {
            diesel::update(tasks::table.filter(tasks::id.eq(task_id.into_inner())))
                .set(tasks::position.eq(position_to_db(position)))
                .execute(connection)?;
        }
    }
    Ok(())
}

#[async_trait]
impl PersistenceGateway for PostgresGateway {
    async fn find_board(&self, id: BoardId) -> GatewayResult<Option<Board>> {
        self.run_blocking(move |connection| {
            let row = boards::table
                .filter(boards::id.eq(id.into_inner()))
                .select(BoardRow::as_select())
                .first::<BoardRow>(connection)
                .optional()
                .map_err(GatewayError::backend)?;
            Ok(row.map(row_to_board))
        })
        .await
    }

    async fn find_column(&self, id: ColumnId) -> GatewayResult<Option<Column>> {
        self.run_blocking(move |connection| {
            let row = columns::table
                .filter(columns::id.eq(id.into_inner()))
                .select(ColumnRow::as_select())
                .first::<ColumnRow>(connection)
                .optional()
                .map_err(GatewayError::backend)?;
            row.map(row_to_column).transpose()
        })
        .await
    }

    async fn find_task(&self, id: TaskId) -> GatewayResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::id.eq(id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(GatewayError::backend)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn load_columns_for_board(&self, board_id: BoardId) -> GatewayResult<Vec<Column>> {
        self.run_blocking(move |connection| {
            let rows = columns::table
                .filter(columns::board_id.eq(board_id.into_inner()))
                .order(columns::position.asc())
                .select(ColumnRow::as_select())
                .load::<ColumnRow>(connection)
                .map_err(GatewayError::backend)?;
            rows.into_iter().map(row_to_column).collect()
        })
        .await
    }

    async fn load_tasks_for_column(&self, column_id: ColumnId) -> GatewayResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .filter(tasks::column_id.eq(column_id.into_inner()))
                .order(tasks::position.asc())
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)
                .map_err(GatewayError::backend)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn commit(&self, changes: ChangeSet) -> GatewayResult<()> {
        self.run_blocking(move |connection| {
            connection
                .transaction::<(), CommitError, _>(|tx_connection| {
                    verify_snapshots(tx_connection, &changes)?;
                    apply_changes(tx_connection, changes)
                })
                .map_err(GatewayError::from)
        })
        .await
    }
}
