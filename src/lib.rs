//! Rota Client - Health-Aware Proxy Rotating HTTP Client
//!
//! An async HTTP client that routes requests through a pool of upstream proxies,
//! retries transient failures and fails over when a proxy stops working.
//!
//! ## Features
//!
//! - HTTP, HTTPS and SOCKS5 upstream proxies
//! - Per-proxy retry budget with capped linear backoff
//! - Health tracking with masked, serializable snapshots
//! - Direct mode when no proxies are configured
//! - Cancellation of in-flight requests and backoff
//! - Request middleware and caller-supplied log hooks

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod proxy;
pub mod request;
pub mod response;

pub use client::{ProxyClient, ProxyClientBuilder};
pub use config::ClientConfig;
pub use error::{Result, RotaError};
pub use models::{ProxyEndpoint, ProxyProtocol, ProxyStatus};
pub use proxy::{LogHook, LogLevel, RequestMiddleware, Transport, TransportError};
pub use request::Request;
pub use response::ProxyResponse;
pub use tokio_util::sync::CancellationToken;
