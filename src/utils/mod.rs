// file: src/utils/mod.rs
// version: 2.0.0
// guid: 0b7e3f91-5a26-4c48-9d1e-c6f2a8b4e073

//! Utility modules for network arithmetic and local checks

pub mod fs;
pub mod network;

pub use network::NetworkUtils;
