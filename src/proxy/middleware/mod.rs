//! Request middleware run by the client before dispatch
//!
//! Middleware sees and may rewrite the outgoing request. It has no say in
//! which proxy the request is routed through.

mod auth;
mod headers;

pub use auth::{BasicAuth, BearerAuth};
pub use headers::DefaultHeaders;

use crate::request::Request;

/// Hook invoked on every outgoing request, in registration order
pub trait RequestMiddleware: Send + Sync {
    fn on_request(&self, request: &mut Request);
}

impl<F> RequestMiddleware for F
where
    F: Fn(&mut Request) + Send + Sync,
{
    fn on_request(&self, request: &mut Request) {
        self(request)
    }
}
