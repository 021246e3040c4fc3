//! Unit tests for the ordering engine.

mod ordered_tests;
mod reorder_service_tests;
