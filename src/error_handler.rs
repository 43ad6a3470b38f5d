//! Status-code fallbacks.
//!
//! When the dispatcher has to answer with a 404 (nothing matched) or a 500
//! (a handler or middleware failed) it asks [`ErrorHandlers`] for the
//! response. A registered handler wins; otherwise a built-in plain-text
//! response is used, e.g. body `404 Not Found` with status `404 NOT FOUND`.

use std::collections::HashMap;

use http::StatusCode;
use tracing::error;

use crate::handler::{guarded, BoxedHandler};
use crate::request::Request;
use crate::response::Response;

/// Status code → handler registry.
#[derive(Clone, Default)]
pub struct ErrorHandlers {
    handlers: HashMap<StatusCode, BoxedHandler>,
}

impl ErrorHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `code`, replacing any earlier one.
    pub fn register(&mut self, code: StatusCode, handler: BoxedHandler) {
        self.handlers.insert(code, handler);
    }

    pub fn contains(&self, code: StatusCode) -> bool {
        self.handlers.contains_key(&code)
    }

    /// The response for `code`.
    ///
    /// A registered handler that fails falls back to the 500 path; a failing
    /// 500 handler falls back to the built-in 500.
    pub fn respond(&self, code: StatusCode, req: &Request) -> Response {
        let Some(handler) = self.handlers.get(&code) else {
            return default_response(code);
        };
        match guarded(|| handler.call(req)) {
            Ok(res) => res,
            Err(err) => {
                error!(status = code.as_u16(), path = req.path(), "error handler failed: {err:#}");
                if code == StatusCode::INTERNAL_SERVER_ERROR {
                    default_response(code)
                } else {
                    self.respond(StatusCode::INTERNAL_SERVER_ERROR, req)
                }
            }
        }
    }
}

/// The built-in response for `code`: `"<code> <reason>"` as plain text.
pub fn default_response(code: StatusCode) -> Response {
    let body = match code.canonical_reason() {
        Some(reason) => format!("{} {reason}", code.as_str()),
        None => code.as_str().to_owned(),
    };
    Response::builder().status(code).text(body)
}
