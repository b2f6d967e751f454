// file: src/logging/mod.rs
// version: 1.1.0
// guid: 3e8b1d52-9f04-4c6a-8d27-b5a1c9e0f713

//! Logging setup for the bootstrap engine

pub mod logger;

pub use logger::{init_json_logger, init_logger, with_async_operation_span};
