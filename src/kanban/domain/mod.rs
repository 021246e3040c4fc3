//! Domain model for board, column, and task ordering.
//!
//! The ordering domain models dense position sequences, column-to-status
//! mapping, and the aggregates they act on, while keeping all infrastructure
//! concerns outside of the domain boundary.

mod board;
mod column;
mod error;
mod ids;
mod ordered;
pub mod position;
pub mod status;
mod task;

pub use board::Board;
pub use column::{Column, PersistedColumnData};
pub use error::{KanbanDomainError, ParseTaskPriorityError, ParseTaskStatusError};
pub use ids::{BoardId, ColumnId, TaskId};
pub use ordered::{Ordered, OrderedCollection};
pub use position::Position;
pub use status::{StatusConflict, TaskStatus};
pub use task::{PersistedTaskData, Task, TaskPriority};
