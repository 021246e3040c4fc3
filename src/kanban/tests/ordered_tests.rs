//! Unit tests for the ordered-collection value type.

use crate::kanban::domain::{
    BoardId, Column, ColumnId, OrderedCollection, Position, TaskStatus,
};
use eyre::ensure;
use mockable::DefaultClock;
use rstest::rstest;

fn column_at(board_id: BoardId, title: &str, ordinal: u32) -> eyre::Result<Column> {
    Ok(Column::new(
        board_id,
        title,
        None,
        None,
        Position::new(ordinal),
        &DefaultClock,
    )?)
}

#[rstest]
fn new_sorts_children_by_position() -> eyre::Result<()> {
    let board_id = BoardId::new();
    let last = column_at(board_id, "Done", 2)?;
    let first = column_at(board_id, "Todo", 0)?;
    let middle = column_at(board_id, "In Progress", 1)?;

    let scope = OrderedCollection::new(
        board_id,
        vec![last.clone(), first.clone(), middle.clone()],
    );

    ensure!(scope.ids() == vec![first.id(), middle.id(), last.id()]);
    ensure!(scope.len() == 3);
    ensure!(!scope.is_empty());
    ensure!(scope.contains(middle.id()));
    ensure!(!scope.contains(ColumnId::new()));
    Ok(())
}

#[rstest]
fn with_order_returns_a_new_value_and_keeps_the_original() -> eyre::Result<()> {
    let board_id = BoardId::new();
    let a = column_at(board_id, "Backlog", 0)?;
    let b = column_at(board_id, "Todo", 1)?;
    let c = column_at(board_id, "Done", 2)?;
    let scope = OrderedCollection::new(board_id, vec![a.clone(), b.clone(), c.clone()]);

    let reordered = scope.with_order(&[c.id(), a.id(), b.id()]);

    ensure!(reordered.ids() == vec![c.id(), a.id(), b.id()]);
    ensure!(scope.ids() == vec![a.id(), b.id(), c.id()]);
    Ok(())
}

#[rstest]
fn with_order_ignores_unknown_ids_and_keeps_missing_at_tail() -> eyre::Result<()> {
    let board_id = BoardId::new();
    let a = column_at(board_id, "Backlog", 0)?;
    let b = column_at(board_id, "Todo", 1)?;
    let c = column_at(board_id, "Done", 2)?;
    let scope = OrderedCollection::new(board_id, vec![a.clone(), b.clone(), c.clone()]);

    let reordered = scope.with_order(&[b.id(), ColumnId::new()]);

    ensure!(reordered.ids() == vec![b.id(), a.id(), c.id()]);
    Ok(())
}

#[rstest]
fn empty_scope_behaves() {
    let board_id = BoardId::new();
    let scope: OrderedCollection<BoardId, Column> = OrderedCollection::new(board_id, Vec::new());

    assert!(scope.is_empty());
    assert!(scope.ids().is_empty());
    assert_eq!(scope.parent(), board_id);
}

#[rstest]
fn column_status_tag_is_preserved_through_collection(
) -> eyre::Result<()> {
    let board_id = BoardId::new();
    let qa = Column::new(
        board_id,
        "QA",
        Some(TaskStatus::Review),
        None,
        Position::ZERO,
        &DefaultClock,
    )?;
    let scope = OrderedCollection::new(board_id, vec![qa.clone()]);

    let items = scope.items();
    ensure!(items.len() == 1);
    ensure!(items[0].status() == Some(TaskStatus::Review));
    Ok(())
}
