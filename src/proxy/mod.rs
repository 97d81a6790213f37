//! Proxy rotation core
//!
//! This module provides:
//! - The proxy pool and its health state
//! - The transport capability and its reqwest implementation
//! - Failure classification
//! - The rotation/retry controller
//! - Request middleware and log hooks

pub mod classify;
pub mod log_hook;
pub mod middleware;
pub mod pool;
pub mod rotation;
pub mod transport;

pub use classify::{classify, Classification};
pub use log_hook::{LogHook, LogLevel, NoopLogHook, NO_PROXY};
pub use middleware::{BasicAuth, BearerAuth, DefaultHeaders, RequestMiddleware};
pub use pool::ProxyPool;
pub use rotation::{RetryPolicy, RotationController};
pub use transport::{ReqwestTransport, Transport, TransportError, TransportErrorKind, TransportResponse};
