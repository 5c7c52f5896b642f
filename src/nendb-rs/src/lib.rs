//! NenDB Client Library
//!
//! HTTP client for connecting to NenDB graph servers: health checks, graph
//! statistics, and parameterized graph algorithms (BFS, Dijkstra, PageRank).
//!
//! Graph storage and algorithm execution live in the server; this crate is
//! the request/response layer only: pooled connections, bounded retries with
//! exponential backoff, per-request timeouts, and pre-flight validation of
//! algorithm parameters.

mod client;
mod config;
mod error;
mod transport;

pub use client::Client;
pub use config::ClientConfig;
pub use error::ClientError;
pub use transport::{RequestDescriptor, Transport};

pub type Result<T> = std::result::Result<T, ClientError>;
