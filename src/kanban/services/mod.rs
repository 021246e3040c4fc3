//! Orchestration services for reorder and lifecycle operations.

mod lifecycle;
mod reorder;

pub use lifecycle::{BoardLifecycleService, LifecycleError, LifecycleResult};
pub use reorder::{
    BoardOrdering, ColumnOrdering, CrossColumnMove, ReorderError, ReorderResult, ReorderService,
};
