//! Failure classification for proxied requests

use http::StatusCode;

use super::transport::{TransportError, TransportErrorKind, TransportResponse};

/// What the controller should do with the outcome of one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Hand the response to the caller
    Success,
    /// Upstream answered 5xx; retry on the same proxy
    ServerError,
    /// The proxy itself refused us; fail over without retrying
    ProxyUnusable,
    /// Network-level hiccup; retry on the same proxy
    Transient,
}

impl Classification {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Classification::ServerError | Classification::Transient)
    }
}

/// Fragments of error text that mean the proxy itself turned us away.
///
/// Covers reqwest's CONNECT tunnel and SOCKS handshake failures as well as the
/// wording custom transports commonly use.
const PROXY_REJECTION_MARKERS: &[&str] = &[
    "proxy authentication required",
    "proxy authorization required",
    "socks connect",
    "socks proxy",
    "socks error",
];

/// Classify the result of one transport call.
///
/// `proxied` tells whether the call went through a proxy; a bare 407 is only
/// evidence against the proxy when there was one.
pub fn classify(
    result: &Result<TransportResponse, TransportError>,
    proxied: bool,
) -> Classification {
    match result {
        Ok(response) => classify_status(response.status, proxied),
        Err(err) => classify_error(err),
    }
}

pub fn classify_status(status: StatusCode, proxied: bool) -> Classification {
    if proxied && status == StatusCode::PROXY_AUTHENTICATION_REQUIRED {
        Classification::ProxyUnusable
    } else if status.is_server_error() {
        Classification::ServerError
    } else {
        Classification::Success
    }
}

pub fn classify_error(err: &TransportError) -> Classification {
    if err.kind == TransportErrorKind::ProxyRejected || is_proxy_rejection(err) {
        Classification::ProxyUnusable
    } else {
        Classification::Transient
    }
}

/// Does the error say the proxy rejected our credentials or the SOCKS handshake?
pub fn is_proxy_rejection(err: &TransportError) -> bool {
    is_proxy_rejection_message(&err.message)
}

pub fn is_proxy_rejection_message(message: &str) -> bool {
    let message = message.to_lowercase();
    PROXY_REJECTION_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}
