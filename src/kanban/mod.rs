//! Board, column, and task ordering for the Kanban tracker.
//!
//! This module implements the ordering and status-consistency engine: dense
//! zero-based `position` sequences for columns within a board and tasks
//! within a column, atomic cross-column task moves, and reconciliation of a
//! task's explicit status with the status derivable from its current column.
//! The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]
//!
//! Authorization is a caller precondition: the surrounding request layer
//! verifies project access before invoking any operation here.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
