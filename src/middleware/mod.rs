//! Middleware layer.
//!
//! Two ordered lists run around every dispatch:
//!
//! - **before** middleware sees the request first. The first one to return
//!   [`Flow::Override`] ends the request right there: no static lookup, no
//!   route, no after-middleware. Use it for auth checks and rejections.
//! - **after** middleware sees the request and the *current* response. An
//!   override replaces the current response for every later middleware and
//!   for the caller; [`Flow::Continue`] leaves it as is.
//!
//! Both lists keep registration order and are never reordered or deduplicated.
//!
//! ```rust
//! use easyapi::{Dispatcher, Flow, Middleware, Request, Response};
//! use http::{Method, StatusCode};
//!
//! let app = Dispatcher::new()
//!     .add_route("/", |_req: &Request| Response::text("home"), [Method::GET])
//!     .use_middleware(Middleware::before(|req: &Request| {
//!         match req.header("authorization") {
//!             Some(_) => Flow::Continue,
//!             None => Flow::Override(Response::status(StatusCode::UNAUTHORIZED)),
//!         }
//!     }))
//!     .use_middleware(Middleware::after(|_req: &Request, res: &Response| {
//!         Some(res.clone().with_header("x-served-by", "easyapi"))
//!     }));
//!
//! let res = app.handle(Request::new(Method::GET, "/"));
//! assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
//! ```

mod header;
mod trace;

use std::sync::Arc;

use crate::handler::guarded;
use crate::request::Request;
use crate::response::Response;

pub use header::SetHeader;
pub use trace::trace;

/// What a middleware decided.
#[derive(Debug)]
pub enum Flow {
    /// Leave the request (or current response) alone.
    Continue,
    /// Use this response instead.
    Override(Response),
}

/// Return types accepted from middleware functions.
///
/// `()` and `None` mean [`Flow::Continue`]; `Some(response)` means
/// [`Flow::Override`]. An `Err` is a middleware failure and becomes a 500.
pub trait IntoFlow {
    fn into_flow(self) -> anyhow::Result<Flow>;
}

impl IntoFlow for Flow {
    fn into_flow(self) -> anyhow::Result<Flow> { Ok(self) }
}

impl IntoFlow for () {
    fn into_flow(self) -> anyhow::Result<Flow> { Ok(Flow::Continue) }
}

impl IntoFlow for Option<Response> {
    fn into_flow(self) -> anyhow::Result<Flow> {
        Ok(self.map_or(Flow::Continue, Flow::Override))
    }
}

impl<T, E> IntoFlow for Result<T, E>
where
    T: IntoFlow,
    E: Into<anyhow::Error>,
{
    fn into_flow(self) -> anyhow::Result<Flow> {
        self.map_err(Into::into)?.into_flow()
    }
}

/// Runs before routing: `(request) -> flow`.
pub trait Before: Send + Sync + 'static {
    fn before(&self, req: &Request) -> anyhow::Result<Flow>;
}

impl<F, R> Before for F
where
    F: Fn(&Request) -> R + Send + Sync + 'static,
    R: IntoFlow,
{
    fn before(&self, req: &Request) -> anyhow::Result<Flow> {
        self(req).into_flow()
    }
}

/// Runs after routing: `(request, current response) -> flow`.
pub trait After: Send + Sync + 'static {
    fn after(&self, req: &Request, res: &Response) -> anyhow::Result<Flow>;
}

impl<F, R> After for F
where
    F: Fn(&Request, &Response) -> R + Send + Sync + 'static,
    R: IntoFlow,
{
    fn after(&self, req: &Request, res: &Response) -> anyhow::Result<Flow> {
        self(req, res).into_flow()
    }
}

/// A middleware registration, tagged with the phase it runs in.
#[derive(Clone)]
pub enum Middleware {
    Before(Arc<dyn Before>),
    After(Arc<dyn After>),
}

impl Middleware {
    pub fn before(mw: impl Before) -> Self {
        Self::Before(Arc::new(mw))
    }

    pub fn after(mw: impl After) -> Self {
        Self::After(Arc::new(mw))
    }
}

/// The ordered before/after lists.
#[derive(Clone, Default)]
pub struct Pipeline {
    before: Vec<Arc<dyn Before>>,
    after: Vec<Arc<dyn After>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mw: impl Into<Middleware>) {
        match mw.into() {
            Middleware::Before(mw) => self.before.push(mw),
            Middleware::After(mw) => self.after.push(mw),
        }
    }

    pub fn before_len(&self) -> usize { self.before.len() }
    pub fn after_len(&self) -> usize { self.after.len() }

    /// Runs the before list. `Ok(Some(_))` is the first override; an error
    /// stops the scan just like an override would.
    pub(crate) fn run_before(&self, req: &Request) -> anyhow::Result<Option<Response>> {
        for mw in &self.before {
            if let Flow::Override(res) = guarded(|| mw.before(req))? {
                return Ok(Some(res));
            }
        }
        Ok(None)
    }

    /// Runs the after list against `res`, threading overrides through.
    ///
    /// A failing middleware swaps the current response for `on_error(err)`
    /// and the scan carries on with the rest of the list.
    pub(crate) fn run_after(
        &self,
        req: &Request,
        mut res: Response,
        on_error: impl Fn(anyhow::Error) -> Response,
    ) -> Response {
        for mw in &self.after {
            match guarded(|| mw.after(req, &res)) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Override(replacement)) => res = replacement,
                Err(err) => res = on_error(err),
            }
        }
        res
    }
}
