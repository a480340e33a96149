// propflow-api: Async Rust client for the Propflow back-office REST API.

pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use client::GatewayClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
