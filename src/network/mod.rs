// src/network/mod.rs
pub mod protocol;
pub mod server;
pub mod transport;

pub use server::VaultServer;
pub use transport::{LocalTransport, TcpTransport, TransportConfig, TransportError, VaultTransport};
