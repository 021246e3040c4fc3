//! Aalto: Kanban board ordering and status-consistency engine.
//!
//! This crate owns the one part of a Kanban tracker with real invariants:
//! assigning and maintaining dense, contiguous `position` ordinals for
//! columns within a board and tasks within a column, moving tasks between
//! columns atomically, and reconciling a task's logical status with the
//! column it occupies.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: Pure ordering and status logic with no infrastructure
//!   dependencies
//! - **Ports**: Abstract trait interfaces for persistence
//! - **Adapters**: Concrete implementations of ports (in-memory, `PostgreSQL`)
//!
//! # Modules
//!
//! - [`kanban`]: Board, column, and task ordering with status reconciliation

pub mod kanban;
