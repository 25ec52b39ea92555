//! Observability module - request correlation.

mod request_id;

pub use request_id::{RequestId, RequestIdMiddleware, current_request_id};
