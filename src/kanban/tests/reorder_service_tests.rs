//! Service tests for the three reorder operations.

use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

use crate::kanban::adapters::memory::InMemoryGateway;
use crate::kanban::domain::{
    position, Board, BoardId, Column, ColumnId, Task, TaskId, TaskPriority, TaskStatus,
};
use crate::kanban::ports::{
    ChangeSet, GatewayResult, OrderingSnapshot, PersistenceGateway, TaskPositionUpdate,
};
use crate::kanban::services::{ReorderError, ReorderService};
use async_trait::async_trait;
use eyre::{bail, ensure};
use mockable::DefaultClock;
use rstest::rstest;

use super::fixtures::{
    assert_contiguous_columns, assert_contiguous_tasks, stored_task_order, world, World,
};

/// Seeds three tasks into a column and returns their ids in position order.
async fn seed_tasks(world: &World, column_id: ColumnId, count: usize) -> eyre::Result<Vec<TaskId>> {
    let mut ids = Vec::with_capacity(count);
    for index in 0..count {
        let task = world
            .lifecycle
            .add_task(column_id, &format!("task {index}"), TaskPriority::Medium, None)
            .await?;
        ids.push(task.id());
    }
    Ok(ids)
}

async fn seed_column(world: &World, title: &str) -> eyre::Result<ColumnId> {
    let (column, _) = world.lifecycle.add_column(world.board_id, title, None, None).await?;
    Ok(column.id())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn move_within_column_reorders_and_renumbers() -> eyre::Result<()> {
    let world = world()?;
    let column_id = seed_column(&world, "К выполнению").await?;
    let tasks = seed_tasks(&world, column_id, 3).await?;

    let ordering = world
        .reorder
        .move_task_within_column(tasks[2], column_id, 0)
        .await?;

    ensure!(ordering.tasks == vec![tasks[2], tasks[0], tasks[1]]);
    ensure!(stored_task_order(&world.gateway, column_id).await? == ordering.tasks);
    assert_contiguous_tasks(&world.gateway, column_id).await?;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn move_within_column_clamps_out_of_bounds_index() -> eyre::Result<()> {
    let world = world()?;
    let column_id = seed_column(&world, "К выполнению").await?;
    let tasks = seed_tasks(&world, column_id, 3).await?;

    let ordering = world
        .reorder
        .move_task_within_column(tasks[0], column_id, 42)
        .await?;

    ensure!(ordering.tasks == vec![tasks[1], tasks[2], tasks[0]]);
    assert_contiguous_tasks(&world.gateway, column_id).await?;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn move_across_columns_renumbers_both_scopes_and_reconciles_status(
) -> eyre::Result<()> {
    let world = world()?;
    let source_id = seed_column(&world, "К выполнению").await?;
    let destination_id = seed_column(&world, "На проверке").await?;
    let tasks = seed_tasks(&world, source_id, 3).await?;

    let outcome = world
        .reorder
        .move_task_across_columns(tasks[2], source_id, destination_id, 0)
        .await?;

    ensure!(outcome.source.tasks == vec![tasks[0], tasks[1]]);
    ensure!(outcome.destination.tasks == vec![tasks[2]]);
    ensure!(outcome.task.column_id() == destination_id);
    ensure!(outcome.task.status() == TaskStatus::Review);
    ensure!(outcome.task.position() == crate::kanban::domain::Position::ZERO);

    assert_contiguous_tasks(&world.gateway, source_id).await?;
    assert_contiguous_tasks(&world.gateway, destination_id).await?;

    let stored = world
        .gateway
        .find_task(tasks[2])
        .await?
        .ok_or_else(|| eyre::eyre!("moved task vanished"))?;
    ensure!(stored.column_id() == destination_id);
    ensure!(stored.status() == TaskStatus::Review);
    ensure!(stored.position() == crate::kanban::domain::Position::ZERO);
    // The returned task is authoritative: it must carry the committed ordinal.
    ensure!(outcome.task.position() == stored.position());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn move_across_columns_preserves_total_task_count() -> eyre::Result<()> {
    let world = world()?;
    let source_id = seed_column(&world, "В работе").await?;
    let destination_id = seed_column(&world, "Готово").await?;
    let source_tasks = seed_tasks(&world, source_id, 3).await?;
    seed_tasks(&world, destination_id, 2).await?;

    let outcome = world
        .reorder
        .move_task_across_columns(source_tasks[1], source_id, destination_id, 1)
        .await?;
    ensure!(outcome.task.position() == crate::kanban::domain::Position::new(1));

    let source_count = world.gateway.load_tasks_for_column(source_id).await?.len();
    let destination_count = world
        .gateway
        .load_tasks_for_column(destination_id)
        .await?
        .len();
    ensure!(source_count == 2);
    ensure!(destination_count == 3);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn move_to_unmappable_column_keeps_explicit_status() -> eyre::Result<()> {
    let world = world()?;
    let source_id = seed_column(&world, "На проверке").await?;
    let destination_id = seed_column(&world, "Разное").await?;
    let tasks = seed_tasks(&world, source_id, 1).await?;

    let outcome = world
        .reorder
        .move_task_across_columns(tasks[0], source_id, destination_id, 0)
        .await?;

    // Seeded in "На проверке", so the explicit status was review and stays so.
    ensure!(outcome.task.status() == TaskStatus::Review);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cross_board_move_is_rejected_without_writes() -> eyre::Result<()> {
    let world = world()?;
    let source_id = seed_column(&world, "К выполнению").await?;
    let tasks = seed_tasks(&world, source_id, 2).await?;

    let other_board = Board::new("Другая доска", &DefaultClock)?;
    let other_board_id = other_board.id();
    world.gateway.seed_board(other_board)?;
    let (foreign_column, _) = world
        .lifecycle
        .add_column(other_board_id, "Готово", None, None)
        .await?;

    let result = world
        .reorder
        .move_task_across_columns(tasks[0], source_id, foreign_column.id(), 0)
        .await;

    ensure!(matches!(
        result,
        Err(ReorderError::CrossBoardMove { .. })
    ));
    ensure!(stored_task_order(&world.gateway, source_id).await? == tasks);
    ensure!(
        world
            .gateway
            .load_tasks_for_column(foreign_column.id())
            .await?
            .is_empty()
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_task_and_column_fail_fast() -> eyre::Result<()> {
    let world = world()?;
    let column_id = seed_column(&world, "К выполнению").await?;
    let tasks = seed_tasks(&world, column_id, 1).await?;

    let missing_task = world
        .reorder
        .move_task_across_columns(TaskId::new(), column_id, column_id, 0)
        .await;
    ensure!(matches!(missing_task, Err(ReorderError::TaskNotFound(_))));

    let missing_column = world
        .reorder
        .move_task_across_columns(tasks[0], column_id, ColumnId::new(), 0)
        .await;
    ensure!(matches!(
        missing_column,
        Err(ReorderError::ColumnNotFound(_))
    ));

    let wrong_source = seed_column(&world, "Готово").await?;
    let not_in_column = world
        .reorder
        .move_task_across_columns(tasks[0], wrong_source, column_id, 0)
        .await;
    ensure!(matches!(
        not_in_column,
        Err(ReorderError::TaskNotInColumn { .. })
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn move_column_reorders_board_scope() -> eyre::Result<()> {
    let world = world()?;
    let first = seed_column(&world, "К выполнению").await?;
    let second = seed_column(&world, "В работе").await?;
    let third = seed_column(&world, "Готово").await?;

    let ordering = world.reorder.move_column(world.board_id, third, 0).await?;

    ensure!(ordering.columns == vec![third, first, second]);
    assert_contiguous_columns(&world.gateway, world.board_id).await?;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn move_column_on_missing_board_fails_fast() -> eyre::Result<()> {
    let world = world()?;
    let result = world
        .reorder
        .move_column(BoardId::new(), ColumnId::new(), 0)
        .await;
    ensure!(matches!(result, Err(ReorderError::BoardNotFound(_))));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_commit_leaves_both_scopes_untouched() -> eyre::Result<()> {
    let world = world()?;
    let source_id = seed_column(&world, "К выполнению").await?;
    let destination_id = seed_column(&world, "Готово").await?;
    let source_tasks = seed_tasks(&world, source_id, 3).await?;
    let destination_tasks = seed_tasks(&world, destination_id, 1).await?;

    world.gateway.fail_next_commit()?;
    let result = world
        .reorder
        .move_task_across_columns(source_tasks[2], source_id, destination_id, 0)
        .await;

    ensure!(matches!(result, Err(ReorderError::Persistence(_))));
    ensure!(stored_task_order(&world.gateway, source_id).await? == source_tasks);
    ensure!(stored_task_order(&world.gateway, destination_id).await? == destination_tasks);
    assert_contiguous_tasks(&world.gateway, source_id).await?;
    assert_contiguous_tasks(&world.gateway, destination_id).await?;
    Ok(())
}

/// Gateway wrapper that lets a competing writer reorder a column between a
/// transaction's load and its commit, to exercise the optimistic retry.
struct RacingGateway {
    inner: InMemoryGateway,
    victim: ColumnId,
    race_once: AtomicBool,
    race_forever: bool,
}

impl RacingGateway {
    fn new(inner: InMemoryGateway, victim: ColumnId, race_forever: bool) -> Self {
        Self {
            inner,
            victim,
            race_once: AtomicBool::new(true),
            race_forever,
        }
    }

    async fn interleave_competing_reorder(&self) -> GatewayResult<()> {
        let tasks = self.inner.load_tasks_for_column(self.victim).await?;
        let observed: Vec<TaskId> = tasks.iter().map(Task::id).collect();
        let mut reversed = observed.clone();
        reversed.reverse();
        self.inner
            .commit(ChangeSet {
                snapshots: vec![OrderingSnapshot::ColumnTasks {
                    column_id: self.victim,
                    observed,
                }],
                task_positions: vec![TaskPositionUpdate {
                    column_id: self.victim,
                    positions: position::renumber(&reversed),
                }],
                ..ChangeSet::default()
            })
            .await
    }
}

#[async_trait]
impl PersistenceGateway for RacingGateway {
    async fn find_board(&self, id: BoardId) -> GatewayResult<Option<Board>> {
        self.inner.find_board(id).await
    }

    async fn find_column(&self, id: ColumnId) -> GatewayResult<Option<Column>> {
        self.inner.find_column(id).await
    }

    async fn find_task(&self, id: TaskId) -> GatewayResult<Option<Task>> {
        self.inner.find_task(id).await
    }

    async fn load_columns_for_board(&self, board_id: BoardId) -> GatewayResult<Vec<Column>> {
        self.inner.load_columns_for_board(board_id).await
    }

    async fn load_tasks_for_column(&self, column_id: ColumnId) -> GatewayResult<Vec<Task>> {
        self.inner.load_tasks_for_column(column_id).await
    }

    async fn commit(&self, changes: ChangeSet) -> GatewayResult<()> {
        if self.race_forever || self.race_once.swap(false, AtomicOrdering::SeqCst) {
            self.interleave_competing_reorder().await?;
        }
        self.inner.commit(changes).await
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn snapshot_conflict_is_retried_once_and_succeeds() -> eyre::Result<()> {
    let world = world()?;
    let column_id = seed_column(&world, "К выполнению").await?;
    let tasks = seed_tasks(&world, column_id, 3).await?;

    let racing = Arc::new(RacingGateway::new(
        (*world.gateway).clone(),
        column_id,
        false,
    ));
    let service = ReorderService::new(Arc::clone(&racing), Arc::new(DefaultClock));

    let ordering = service
        .move_task_within_column(tasks[0], column_id, 2)
        .await?;

    ensure!(ordering.tasks.len() == 3);
    ensure!(ordering.tasks[2] == tasks[0]);
    assert_contiguous_tasks(&world.gateway, column_id).await?;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn persistent_snapshot_conflict_surfaces_reorder_conflict() -> eyre::Result<()> {
    let world = world()?;
    let column_id = seed_column(&world, "К выполнению").await?;
    let tasks = seed_tasks(&world, column_id, 3).await?;

    let racing = Arc::new(RacingGateway::new(
        (*world.gateway).clone(),
        column_id,
        true,
    ));
    let service = ReorderService::new(racing, Arc::new(DefaultClock));

    let result = service.move_task_within_column(tasks[0], column_id, 2).await;

    match result {
        Err(ReorderError::ReorderConflict) => {}
        other => bail!("expected ReorderConflict, got {other:?}"),
    }
    // The competing writer won; the scope must still be contiguous.
    assert_contiguous_tasks(&world.gateway, column_id).await?;
    Ok(())
}
