//! Dense position ordinals and the pure functions that maintain them.
//!
//! A sibling scope (a board's columns, a column's tasks) holds positions that
//! form a contiguous, zero-based, strictly ascending sequence after every
//! committed transaction. [`append_position`] only guarantees "strictly
//! greater than every existing position"; contiguity is restored exclusively
//! by [`renumber`], which must run after every insert, delete, or reorder.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

/// Zero-based ordinal establishing sibling order within a parent scope.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Position(u32);

impl Position {
    /// The first position in a scope.
    pub const ZERO: Self = Self(0);

    /// Creates a position from a raw ordinal.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw ordinal value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Returns the position immediately after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returns the append position for a scope: one past the current maximum,
/// or [`Position::ZERO`] when the scope is empty.
///
/// The result is strictly greater than every existing position even when the
/// input has gaps or duplicates.
#[must_use]
pub fn append_position(existing: &[Position]) -> Position {
    existing
        .iter()
        .copied()
        .max()
        .map_or(Position::ZERO, Position::next)
}

/// Assigns `0..n-1` to `ordered_ids` in the given order.
///
/// This is the sole operation that restores the contiguity invariant. It is
/// idempotent on input that is already contiguous and in order.
#[must_use]
pub fn renumber<I>(ordered_ids: &[I]) -> HashMap<I, Position>
where
    I: Copy + Eq + Hash,
{
    (0_u32..)
        .zip(ordered_ids.iter().copied())
        .map(|(ordinal, id)| (id, Position::new(ordinal)))
        .collect()
}

/// Removes `moved` from its current index (if present) and reinserts it at
/// `target_index` clamped to `0..=len`, returning the new full order.
///
/// An out-of-bounds `target_index` is clamped, never an error. Duplicate ids
/// in the input are a caller contract violation; they are deduplicated
/// (first occurrence wins) so the operation can never panic mid-transaction.
/// The caller must pass the result to [`renumber`].
#[must_use]
pub fn insert_at<I>(ordered_ids: &[I], moved: I, target_index: usize) -> Vec<I>
where
    I: Copy + Eq + Hash,
{
    let mut seen = HashSet::with_capacity(ordered_ids.len());
    let mut order: Vec<I> = ordered_ids
        .iter()
        .copied()
        .filter(|id| *id != moved && seen.insert(*id))
        .collect();
    let index = target_index.min(order.len());
    order.insert(index, moved);
    order
}
