//! Port contracts for the ordering engine.

mod gateway;

pub use gateway::{
    ChangeSet, ColumnPositionUpdate, GatewayError, GatewayResult, OrderingSnapshot,
    PersistenceGateway, Scope, TaskMove, TaskPositionUpdate,
};
