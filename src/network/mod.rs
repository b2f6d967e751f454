// file: src/network/mod.rs
// version: 2.0.0
// guid: 8e5b2d04-c7a1-4f96-b3e8-1d0f6a9c2e57

//! Remote transport and fan-out execution

pub mod executor;
pub mod local;
pub mod ssh;
pub mod transport;

pub use executor::FanOutExecutor;
pub use local::LocalTransport;
pub use ssh::SshTransport;
pub use transport::{Connection, Transport};
