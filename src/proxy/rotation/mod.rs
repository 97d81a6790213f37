//! Proxy rotation
//!
//! The controller walks the pool forward from its cursor, one pass per request,
//! retrying each proxy within the policy's budget before failing over.

mod controller;
mod policy;

pub use controller::RotationController;
pub use policy::RetryPolicy;
