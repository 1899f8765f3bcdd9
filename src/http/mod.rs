//! # HTTP Module
//!
//! Request dispatch with bearer injection, bounded retry, and response
//! handlers that react to authentication and authorization failures.

pub mod handlers;
pub mod pipeline;
pub mod retry;

pub use handlers::{ForbiddenHandler, ForcedLogoutHandler, ResponseHandler};
pub use pipeline::{Ack, ApiRequest, AuthHeader, HttpPipeline};
pub use retry::RetryPolicy;
