//! A parent's owned, ordered children, loaded for one reorder transaction.

use super::Position;
use std::fmt;
use std::hash::Hash;

/// A child entity carrying a position within its sibling scope.
pub trait Ordered {
    /// Identifier type of the child.
    type Id: Copy + Eq + Hash + fmt::Debug;

    /// Returns the child identifier.
    fn id(&self) -> Self::Id;

    /// Returns the child's ordinal within its sibling scope.
    fn position(&self) -> Position;
}

/// In-memory snapshot of a parent's children, sorted by position.
///
/// Reordering goes through [`OrderedCollection::with_order`], which returns a
/// new value rather than mutating in place; the loaded snapshot stays intact
/// for conflict detection and rollback. Loading delegates to the persistence
/// gateway; the services construct collections from `load_*` results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedCollection<P, T> {
    parent: P,
    items: Vec<T>,
}

impl<P, T> OrderedCollection<P, T>
where
    P: Copy,
    T: Ordered + Clone,
{
    /// Wraps freshly loaded children, sorting them by position.
    #[must_use]
    pub fn new(parent: P, mut items: Vec<T>) -> Self {
        items.sort_by_key(Ordered::position);
        Self { parent, items }
    }

    /// Returns the parent identifier.
    #[must_use]
    pub const fn parent(&self) -> P {
        self.parent
    }

    /// Returns the children in order.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Returns the child ids in order.
    #[must_use]
    pub fn ids(&self) -> Vec<T::Id> {
        self.items.iter().map(Ordered::id).collect()
    }

    /// Returns whether the scope holds the given child.
    #[must_use]
    pub fn contains(&self, id: T::Id) -> bool {
        self.items.iter().any(|item| item.id() == id)
    }

    /// Returns the number of children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns whether the scope is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns a new collection holding the same children in the given
    /// order. Ids absent from `order` keep their relative order at the tail;
    /// unknown ids are ignored.
    #[must_use]
    pub fn with_order(&self, order: &[T::Id]) -> Self {
        let mut remaining = self.items.clone();
        let mut reordered = Vec::with_capacity(remaining.len());
        for id in order {
            if let Some(index) = remaining.iter().position(|item| item.id() == *id) {
                reordered.push(remaining.remove(index));
            }
        }
        reordered.append(&mut remaining);
        Self {
            parent: self.parent,
            items: reordered,
        }
    }
}
