//! Default header middleware

use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;

use super::RequestMiddleware;
use crate::error::{Result, RotaError};
use crate::request::Request;

/// Inserts headers the request does not already carry
#[derive(Debug, Clone, Default)]
pub struct DefaultHeaders {
    headers: HeaderMap,
}

impl DefaultHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| RotaError::InvalidConfig(format!("invalid header name {}: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| RotaError::InvalidConfig(format!("invalid value for {}: {}", name, e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }
}

impl RequestMiddleware for DefaultHeaders {
    fn on_request(&self, request: &mut Request) {
        let headers = request.headers_mut();
        for (name, value) in &self.headers {
            if !headers.contains_key(name) {
                headers.insert(name.clone(), value.clone());
            }
        }
    }
}
