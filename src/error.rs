use thiserror::Error;

use crate::proxy::transport::TransportError;

/// Unified error type for the Rota client
#[derive(Error, Debug)]
pub enum RotaError {
    // Configuration errors
    #[error("Invalid proxy address: {0}")]
    InvalidProxyAddress(String),

    #[error("Unsupported proxy protocol: {0}")]
    UnsupportedProtocol(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Request errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to decode response body: {0}")]
    Decode(String),

    // Proxy errors
    #[error("All proxies exhausted after {attempts} attempts{}", last_error_suffix(.last_error))]
    AllProxiesExhausted {
        attempts: u32,
        last_error: Option<TransportError>,
    },

    #[error("Request cancelled")]
    Cancelled,

    // Transport errors (direct mode)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type alias for Rota operations
pub type Result<T> = std::result::Result<T, RotaError>;

fn last_error_suffix(last_error: &Option<TransportError>) -> String {
    match last_error {
        Some(err) => format!(": {}", err),
        None => String::new(),
    }
}

impl RotaError {
    /// Check if this error was raised while building the client
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            RotaError::InvalidProxyAddress(_)
                | RotaError::UnsupportedProtocol(_)
                | RotaError::InvalidConfig(_)
        )
    }

    /// Check if the pool ran out of usable proxies
    pub fn is_exhausted(&self) -> bool {
        matches!(self, RotaError::AllProxiesExhausted { .. })
    }

    /// Check if the caller cancelled the request
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RotaError::Cancelled)
    }

    /// The last transport failure observed before giving up, if any
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            RotaError::AllProxiesExhausted { last_error, .. } => last_error.as_ref(),
            RotaError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

// Convert from URL parse errors
impl From<url::ParseError> for RotaError {
    fn from(err: url::ParseError) -> Self {
        RotaError::InvalidRequest(err.to_string())
    }
}
