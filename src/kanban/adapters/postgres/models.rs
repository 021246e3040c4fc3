//! Diesel row models and domain conversions for the ordering engine.

use super::schema::{boards, columns, tasks};
use crate::kanban::domain::{
    Board, BoardId, Column, ColumnId, PersistedColumnData, PersistedTaskData, Position, Task,
    TaskId, TaskPriority, TaskStatus,
};
use crate::kanban::ports::{GatewayError, GatewayResult};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for board records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = boards)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BoardRow {
    /// Board identifier.
    pub id: uuid::Uuid,
    /// Board name.
    pub name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Query result row for column records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = columns)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ColumnRow {
    /// Column identifier.
    pub id: uuid::Uuid,
    /// Owning board.
    pub board_id: uuid::Uuid,
    /// Display title.
    pub title: String,
    /// Explicit status tag.
    pub status: Option<String>,
    /// Opaque display colour.
    pub color: Option<String>,
    /// Ordinal within the board.
    pub position: i64,
    /// Collapsed flag.
    pub is_collapsed: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Current owning column.
    pub column_id: uuid::Uuid,
    /// Denormalized board reference.
    pub board_id: uuid::Uuid,
    /// Display title.
    pub title: String,
    /// Explicit workflow status.
    pub status: String,
    /// Urgency.
    pub priority: String,
    /// Ordinal within the column.
    pub position: i64,
    /// Assignee handles.
    pub assignees: Vec<String>,
    /// Tag labels.
    pub tags: Vec<String>,
    /// Due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Converts a board row into the domain aggregate.
pub fn row_to_board(row: BoardRow) -> Board {
    Board::from_persisted(BoardId::from_uuid(row.id), row.name, row.created_at)
}

/// Converts a column row into the domain aggregate.
///
/// # Errors
///
/// Returns [`GatewayError::Backend`] when the row carries an unknown status
/// tag or an out-of-range position.
pub fn row_to_column(row: ColumnRow) -> GatewayResult<Column> {
    let status = row
        .status
        .as_deref()
        .map(TaskStatus::try_from)
        .transpose()
        .map_err(GatewayError::backend)?;
    Ok(Column::from_persisted(PersistedColumnData {
        id: ColumnId::from_uuid(row.id),
        board_id: BoardId::from_uuid(row.board_id),
        title: row.title,
        status,
        color: row.color,
        position: position_from_db(row.position)?,
        is_collapsed: row.is_collapsed,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

/// Converts a task row into the domain aggregate.
///
/// # Errors
///
/// Returns [`GatewayError::Backend`] when the row carries an unknown status
/// or priority, or an out-of-range position.
pub fn row_to_task(row: TaskRow) -> GatewayResult<Task> {
    let status = TaskStatus::try_from(row.status.as_str()).map_err(GatewayError::backend)?;
    let priority = TaskPriority::try_from(row.priority.as_str()).map_err(GatewayError::backend)?;
    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(row.id),
        column_id: ColumnId::from_uuid(row.column_id),
        board_id: BoardId::from_uuid(row.board_id),
        title: row.title,
        status,
        priority,
        position: position_from_db(row.position)?,
        assignees: row.assignees,
        tags: row.tags,
        due_date: row.due_date,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

/// Builds an insert row from a domain column.
pub fn column_to_row(column: &Column) -> ColumnRow {
    ColumnRow {
        id: column.id().into_inner(),
        board_id: column.board_id().into_inner(),
        title: column.title().to_owned(),
        status: column.status().map(|status| status.as_str().to_owned()),
        color: column.color().map(str::to_owned),
        position: position_to_db(column.position()),
        is_collapsed: column.is_collapsed(),
        created_at: column.created_at(),
        updated_at: column.updated_at(),
    }
}

/// Builds an insert row from a domain task.
pub fn task_to_row(task: &Task) -> TaskRow {
    TaskRow {
        id: task.id().into_inner(),
        column_id: task.column_id().into_inner(),
        board_id: task.board_id().into_inner(),
        title: task.title().to_owned(),
        status: task.status().as_str().to_owned(),
        priority: task.priority().as_str().to_owned(),
        position: position_to_db(task.position()),
        assignees: task.assignees().to_vec(),
        tags: task.tags().to_vec(),
        due_date: task.due_date(),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    }
}

/// Converts a domain position to its storage representation.
pub fn position_to_db(position: Position) -> i64 {
    i64::from(position.value())
}

/// Converts a stored position back into the domain.
///
/// # Errors
///
/// Returns [`GatewayError::Backend`] when the stored value does not fit the
/// domain ordinal range.
pub fn position_from_db(value: i64) -> GatewayResult<Position> {
    u32::try_from(value)
        .map(Position::new)
        .map_err(GatewayError::backend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::ensure;
    use mockable::{Clock, DefaultClock};
    use rstest::rstest;

    #[rstest]
    fn column_round_trips_through_its_row() -> eyre::Result<()> {
        let mut column = Column::new(
            BoardId::new(),
            "На проверке",
            Some(TaskStatus::Review),
            Some("#2a9d8f".to_owned()),
            Position::new(2),
            &DefaultClock,
        )?;
        column.set_collapsed(true, &DefaultClock);

        let restored = row_to_column(column_to_row(&column))?;

        ensure!(restored == column);
        Ok(())
    }

    #[rstest]
    fn task_round_trips_through_its_row() -> eyre::Result<()> {
        let task = Task::new(
            BoardId::new(),
            ColumnId::new(),
            "Перенести индексы",
            TaskStatus::InProgress,
            TaskPriority::High,
            Position::new(4),
            &DefaultClock,
        )?
        .with_assignees(["maria".to_owned()])
        .with_tags(["infra".to_owned(), "db".to_owned()])
        .with_due_date(DefaultClock.utc());

        let restored = row_to_task(task_to_row(&task))?;

        ensure!(restored == task);
        Ok(())
    }

    #[rstest]
    fn unknown_stored_status_is_a_backend_error() -> eyre::Result<()> {
        let task = Task::new(
            BoardId::new(),
            ColumnId::new(),
            "x",
            TaskStatus::Todo,
            TaskPriority::Medium,
            Position::ZERO,
            &DefaultClock,
        )?;
        let mut row = task_to_row(&task);
        row.status = "half_done".to_owned();

        ensure!(row_to_task(row).is_err());
        Ok(())
    }

    #[rstest]
    #[case(0, Some(0))]
    #[case(41, Some(41))]
    #[case(-1, None)]
    #[case(i64::from(u32::MAX) + 1, None)]
    fn stored_positions_outside_the_ordinal_range_are_rejected(
        #[case] stored: i64,
        #[case] expected: Option<u32>,
    ) {
        let result = position_from_db(stored);
        match expected {
            Some(value) => assert_eq!(result.ok(), Some(Position::new(value))),
            None => assert!(result.is_err()),
        }
    }
}
