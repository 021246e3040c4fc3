//! In-memory persistence gateway for tests and single-process use.

mod gateway;

pub use gateway::InMemoryGateway;
