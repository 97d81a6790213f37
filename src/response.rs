//! Response returned to callers of the client

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::{Result, RotaError};
use crate::proxy::transport::TransportResponse;

/// A completed response plus the (masked) proxy that served it
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    proxy: Option<String>,
}

impl ProxyResponse {
    pub(crate) fn new(response: TransportResponse, proxy: Option<String>) -> Self {
        Self {
            status: response.status,
            headers: response.headers,
            body: response.body,
            proxy,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    pub fn into_bytes(self) -> Bytes {
        self.body
    }

    /// Body decoded as UTF-8, lossily
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| RotaError::Decode(e.to_string()))
    }

    /// Masked URL of the proxy that served this response; `None` in direct mode
    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }
}
