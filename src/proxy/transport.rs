//! Transport layer for outbound HTTP requests
//!
//! Executes a single request, optionally through an upstream proxy. The proxy is
//! a per-call argument: every proxy gets its own immutable client, so requests
//! routed through different proxies never share mutable transport state.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use super::classify::is_proxy_rejection_message;
use crate::error::{Result, RotaError};
use crate::models::ProxyEndpoint;
use crate::request::Request;

/// Coarse category of a transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportErrorKind {
    Connect,
    Timeout,
    Request,
    Body,
    Status,
    /// The proxy refused the tunnel or handshake
    ProxyRejected,
    Other,
}

impl TransportErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Request => "request",
            TransportErrorKind::Body => "body",
            TransportErrorKind::Status => "status",
            TransportErrorKind::ProxyRejected => "proxy_rejected",
            TransportErrorKind::Other => "other",
        }
    }
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Normalized failure of one transport call
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Failure recorded when an upstream keeps answering with `status`
    pub fn status(status: StatusCode) -> Self {
        Self::new(TransportErrorKind::Status, format!("upstream returned {}", status))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let message = error_chain(&err);
        let kind = if is_proxy_rejection_message(&message) {
            TransportErrorKind::ProxyRejected
        } else if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else if err.is_body() || err.is_decode() {
            TransportErrorKind::Body
        } else if err.is_request() {
            TransportErrorKind::Request
        } else {
            TransportErrorKind::Other
        };

        Self::new(kind, message)
    }
}

/// Render an error and all of its sources as one line
///
/// Proxy rejections are usually buried a few levels down the source chain, so
/// the classifier needs the whole chain rather than the outermost message.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Response of one transport call, body fully buffered
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

/// Capability that performs the network I/O for one HTTP call
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute `request`, routed through `proxy` when one is given
    async fn execute(
        &self,
        request: &Request,
        proxy: Option<&ProxyEndpoint>,
        timeout: Duration,
    ) -> std::result::Result<TransportResponse, TransportError>;
}

/// Transport backed by reqwest
///
/// Keeps one client per proxy URL, built on first use. Clients are never
/// reconfigured after construction.
pub struct ReqwestTransport {
    direct: reqwest::Client,
    proxied: DashMap<String, reqwest::Client>,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let direct = reqwest::Client::builder()
            .no_proxy()
            .build()
            .map_err(|e| RotaError::InvalidConfig(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            direct,
            proxied: DashMap::new(),
        })
    }

    fn client_for(
        &self,
        proxy: Option<&ProxyEndpoint>,
    ) -> std::result::Result<reqwest::Client, TransportError> {
        let Some(proxy) = proxy else {
            return Ok(self.direct.clone());
        };

        if let Some(client) = self.proxied.get(proxy.url()) {
            return Ok(client.clone());
        }

        debug!("Building client for proxy {}", proxy.masked_url());
        let upstream = reqwest::Proxy::all(proxy.url()).map_err(|e| {
            TransportError::new(TransportErrorKind::Request, error_chain(&e))
        })?;
        let client = reqwest::Client::builder()
            .proxy(upstream)
            .build()
            .map_err(|e| TransportError::new(TransportErrorKind::Other, error_chain(&e)))?;

        // A concurrent caller may have raced us here; either client is equivalent.
        let client = self
            .proxied
            .entry(proxy.url().to_string())
            .or_insert(client)
            .clone();
        Ok(client)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(skip_all, fields(method = %request.method(), url = %request.url()))]
    async fn execute(
        &self,
        request: &Request,
        proxy: Option<&ProxyEndpoint>,
        timeout: Duration,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let client = self.client_for(proxy)?;

        let mut builder = client
            .request(request.method().clone(), request.url().clone())
            .headers(request.headers().clone())
            .timeout(timeout);
        if let Some(body) = request.body_bytes() {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        debug!("Upstream answered {} ({} bytes)", status, body.len());
        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("outer failure")]
    struct Outer(#[source] Inner);

    #[derive(Debug, Error)]
    #[error("Proxy Authentication Required")]
    struct Inner;

    #[test]
    fn test_error_chain_includes_sources() {
        assert_eq!(
            error_chain(&Outer(Inner)),
            "outer failure: Proxy Authentication Required"
        );
    }

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::status(StatusCode::BAD_GATEWAY);
        assert_eq!(err.kind, TransportErrorKind::Status);
        assert_eq!(err.to_string(), "status: upstream returned 502 Bad Gateway");
    }

    #[derive(Debug, Error)]
    #[error("client error (Connect)")]
    struct Connect(#[source] Tunnel);

    #[derive(Debug, Error)]
    #[error("tunnel error: proxy authorization required")]
    struct Tunnel;

    #[test]
    fn test_error_chain_reaches_tunnel_rejection() {
        let message = error_chain(&Connect(Tunnel));
        assert!(is_proxy_rejection_message(&message));
        assert_eq!(TransportErrorKind::ProxyRejected.as_str(), "proxy_rejected");
        assert_eq!(
            serde_json::to_value(TransportErrorKind::ProxyRejected).unwrap(),
            "proxy_rejected"
        );
    }

    #[test]
    fn test_transport_error_serializes() {
        let err = TransportError::new(TransportErrorKind::Connect, "connection refused");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "connect");
        assert_eq!(json["message"], "connection refused");
    }

    #[test]
    fn test_client_cache_reuses_proxy_client() {
        let transport = ReqwestTransport::new().unwrap();
        let proxy = ProxyEndpoint::parse("http://127.0.0.1:3128").unwrap();

        transport.client_for(Some(&proxy)).unwrap();
        transport.client_for(Some(&proxy)).unwrap();
        transport.client_for(None).unwrap();

        assert_eq!(transport.proxied.len(), 1);
    }
}
