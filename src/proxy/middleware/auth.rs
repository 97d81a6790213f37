//! Authentication middleware
//!
//! Attaches credentials for the target server. Proxy credentials travel in
//! the proxy URL and are handled by the transport.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use http::header::{HeaderValue, AUTHORIZATION};
use tracing::warn;

use super::RequestMiddleware;
use crate::request::Request;

/// Sets `Authorization: Basic ...` on every request
#[derive(Clone)]
pub struct BasicAuth {
    /// Encoded header value
    value: String,
}

impl BasicAuth {
    pub fn new(username: &str, password: &str) -> Self {
        let credentials = format!("{}:{}", username, password);
        Self {
            value: format!("Basic {}", BASE64.encode(credentials.as_bytes())),
        }
    }
}

impl RequestMiddleware for BasicAuth {
    fn on_request(&self, request: &mut Request) {
        set_authorization(request, &self.value);
    }
}

/// Sets `Authorization: Bearer <token>` on every request
#[derive(Clone)]
pub struct BearerAuth {
    value: String,
}

impl BearerAuth {
    pub fn new(token: &str) -> Self {
        Self {
            value: format!("Bearer {}", token),
        }
    }
}

impl RequestMiddleware for BearerAuth {
    fn on_request(&self, request: &mut Request) {
        set_authorization(request, &self.value);
    }
}

fn set_authorization(request: &mut Request, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(mut value) => {
            value.set_sensitive(true);
            request.headers_mut().insert(AUTHORIZATION, value);
        }
        Err(_) => warn!("Skipping Authorization header with invalid characters"),
    }
}
