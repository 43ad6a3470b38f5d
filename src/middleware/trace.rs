//! Request logging.

use tracing::info;

use crate::middleware::{Flow, Middleware};
use crate::request::Request;

/// Before-middleware that logs every request's method and path at `info`.
/// It never overrides.
pub fn trace() -> Middleware {
    Middleware::before(log_request)
}

fn log_request(req: &Request) -> Flow {
    info!(method = %req.method(), path = req.path(), "request received");
    Flow::Continue
}
