// file: src/cli/mod.rs
// version: 2.0.0
// guid: 93d0e6b5-1f4a-4c72-8b39-e5a7c2d1f084

//! Command line interface for the bootstrap engine

pub mod args;
pub mod commands;

pub use args::Cli;
pub use commands::*;
