//! Handler trait and type erasure.
//!
//! # How handlers are stored
//!
//! The route table holds handlers of *different* types in one map, so every
//! handler is erased behind `Arc<dyn Handler>`:
//!
//! ```text
//! fn home(req: &Request) -> Response { … }   ← user writes this
//!        ↓ dispatcher.add_route("/", home, [Method::GET])
//! Arc::new(home)                              ← BoxedHandler
//!        ↓  shared by every worker thread
//! handler.call(&req)  at request time         ← one vtable dispatch
//! ```
//!
//! Any `Fn(&Request) -> R` is a handler when `R` is an [`IntoResponse`] or a
//! `Result` of one. Structs implement [`Handler`] directly when they need to
//! hold references to collaborators (a cache, a payment gateway, …).

use std::any::{type_name, Any};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use anyhow::anyhow;
use http::StatusCode;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// What a handler produces: a response, or the error that becomes a 500.
pub type HandlerResult = Result<Response, anyhow::Error>;

/// Application logic that produces a response for a matched route.
///
/// Implemented automatically for closures and `fn` items with the shape
/// `Fn(&Request) -> impl IntoHandlerResult`. Implement it by hand on a struct
/// that carries its dependencies:
///
/// ```rust
/// use std::sync::Arc;
/// use easyapi::{Handler, HandlerResult, Request, Response};
/// use easyapi::services::{Cache, MemoryCache};
///
/// struct Greeting {
///     cache: Arc<dyn Cache>,
/// }
///
/// impl Handler for Greeting {
///     fn call(&self, _req: &Request) -> HandlerResult {
///         let hits = self.cache.get("hits")?.unwrap_or_default();
///         Ok(Response::text(format!("hello, {} bytes cached", hits.len())))
///     }
/// }
///
/// let handler = Greeting { cache: Arc::new(MemoryCache::new()) };
/// # let _ = handler;
/// ```
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: &Request) -> HandlerResult;
}

/// A type-erased handler shared across concurrent requests.
pub type BoxedHandler = Arc<dyn Handler>;

/// Erases a handler. Use it to build heterogeneous route lists.
pub fn boxed(handler: impl Handler) -> BoxedHandler {
    Arc::new(handler)
}

impl<F, R> Handler for F
where
    F: Fn(&Request) -> R + Send + Sync + 'static,
    R: IntoHandlerResult,
{
    fn call(&self, req: &Request) -> HandlerResult {
        self(req).into_handler_result()
    }
}

// ── IntoHandlerResult ─────────────────────────────────────────────────────────

/// Return types accepted from handler functions.
pub trait IntoHandlerResult {
    fn into_handler_result(self) -> HandlerResult;
}

impl IntoHandlerResult for Response {
    fn into_handler_result(self) -> HandlerResult { Ok(self) }
}

impl IntoHandlerResult for &'static str {
    fn into_handler_result(self) -> HandlerResult { Ok(self.into_response()) }
}

impl IntoHandlerResult for String {
    fn into_handler_result(self) -> HandlerResult { Ok(self.into_response()) }
}

impl IntoHandlerResult for StatusCode {
    fn into_handler_result(self) -> HandlerResult { Ok(self.into_response()) }
}

impl<T, E> IntoHandlerResult for Result<T, E>
where
    T: IntoResponse,
    E: Into<anyhow::Error>,
{
    fn into_handler_result(self) -> HandlerResult {
        self.map(IntoResponse::into_response).map_err(Into::into)
    }
}

// ── Naming ────────────────────────────────────────────────────────────────────

/// The declared name of a handler type: the last path segment of its type
/// name. `fn get_users` yields `"get_users"`; closures yield `"{{closure}}"`.
pub fn handler_name<H: ?Sized>() -> &'static str {
    let full = type_name::<H>();
    // Strip generic arguments before looking for the last segment.
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

// ── Panic guard ───────────────────────────────────────────────────────────────

/// Runs user code, turning a panic into an error so one bad handler cannot
/// take a worker thread down with it.
pub(crate) fn guarded<T>(f: impl FnOnce() -> anyhow::Result<T>) -> anyhow::Result<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(anyhow!("panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
