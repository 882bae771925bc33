//! Forwarding gateway for the IMwalleT partner API.
//!
//! The binary in `main.rs` wires these pieces together; the library
//! surface exists so integration tests can drive the router and the
//! keep-alive loop directly.

pub mod cli;
pub mod config;
pub mod keepalive;
pub mod proxy;

pub use config::Config;
pub use keepalive::KeepAlive;
pub use proxy::{router, start_proxy, ProxyState, RelayError};
