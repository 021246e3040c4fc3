//! `PostgreSQL` persistence gateway built on Diesel.

mod gateway;
mod models;
mod schema;

pub use gateway::{KanbanPgPool, PostgresGateway};
