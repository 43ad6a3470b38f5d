//! Request dispatch.
//!
//! [`Dispatcher::handle`] resolves one request in a fixed order:
//!
//! 1. before-middleware, in registration order; the first override is
//!    returned as-is and nothing else runs;
//! 2. static files, when a static folder is configured and the path is under
//!    its prefix;
//! 3. the route table, exact `(path, method)` match; a failing handler
//!    becomes the 500 response;
//! 4. the 404 response when neither 2 nor 3 produced anything;
//! 5. after-middleware, in registration order, over whichever response 2–4
//!    produced.
//!
//! `handle` never fails and never panics past its own boundary: every
//! request-phase failure is turned into a response.
//!
//! A dispatcher is configured with consuming builder calls, then frozen.
//! To change routes while serving, wrap it in a [`SharedDispatcher`] and swap
//! whole snapshots.

use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use http::{Method, StatusCode};
use tracing::{debug, error, info};

use crate::blueprint::Blueprint;
use crate::config::Config;
use crate::error::Error;
use crate::error_handler::ErrorHandlers;
use crate::handler::{boxed, guarded, BoxedHandler, Handler};
use crate::middleware::{Middleware, Pipeline};
use crate::request::Request;
use crate::resource::Resource;
use crate::response::Response;
use crate::router::{RouteSpec, RouteTable};
use crate::static_files::StaticAssetResolver;

/// Routes, middleware, error handlers and static files composed into one
/// request → response function.
#[derive(Clone, Default)]
pub struct Dispatcher {
    routes: RouteTable,
    pipeline: Pipeline,
    errors: ErrorHandlers,
    assets: Option<StaticAssetResolver>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A dispatcher with the static folder from `config`, if any.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let dispatcher = Self::new();
        match config.static_resolver()? {
            Some(resolver) => Ok(dispatcher.set_static(resolver)),
            None => Ok(dispatcher),
        }
    }

    /// Registers `handler` for `path` under each of `methods`. An existing
    /// `(path, method)` entry is replaced.
    ///
    /// ```rust
    /// use easyapi::{Dispatcher, Request, Response};
    /// use http::Method;
    ///
    /// let app = Dispatcher::new()
    ///     .add_route("/", |_req: &Request| Response::text("Welcome Home!"), [Method::GET]);
    /// assert_eq!(app.handle(Request::new(Method::GET, "/")).body(), b"Welcome Home!");
    /// ```
    pub fn add_route(
        self,
        path: &str,
        handler: impl Handler,
        methods: impl IntoIterator<Item = Method>,
    ) -> Self {
        self.add_spec(RouteSpec::new(path, methods, handler))
    }

    /// Registers many routes at once: [`RouteSpec`]s, `(path, handler, methods)`
    /// triples, or the entries of a `path → (handler, methods)` map.
    pub fn add_routes<I>(self, entries: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<RouteSpec>,
    {
        entries.into_iter().fold(self, |acc, entry| acc.add_spec(entry.into()))
    }

    /// Registers `handler` for methods inferred from its name
    /// (see [`infer_methods`](crate::infer_methods)).
    pub fn add_route_inferred<H: Handler>(self, path: &str, handler: H) -> Self {
        self.add_spec(RouteSpec::inferred(path, handler))
    }

    /// Registers each verb the resource declares, and only those.
    pub fn add_resource(mut self, path: &str, resource: Resource) -> Self {
        for (method, handler) in resource.into_verbs() {
            self.insert(path, method, handler);
        }
        self
    }

    /// Copies every blueprint entry into the route table under `prefix`.
    /// Later changes to `blueprint` do not reach this dispatcher.
    pub fn register_blueprint(self, blueprint: &Blueprint, prefix: &str) -> Self {
        debug!(blueprint = blueprint.name(), prefix, routes = blueprint.len(), "registering blueprint");
        self.add_routes(blueprint.specs(prefix))
    }

    pub fn use_middleware(mut self, mw: impl Into<Middleware>) -> Self {
        self.pipeline.push(mw);
        self
    }

    /// Registers the handler used whenever the dispatcher answers with `code`
    /// (404 on a miss, 500 on a failure).
    pub fn register_error_handler(mut self, code: StatusCode, handler: impl Handler) -> Self {
        self.errors.register(code, boxed(handler));
        self
    }

    /// Serves files under `root` at `/static/`. Fails if `root` is not a directory.
    pub fn set_static_folder(self, root: impl AsRef<Path>) -> Result<Self, Error> {
        Ok(self.set_static(StaticAssetResolver::new(root)?))
    }

    pub fn set_static(mut self, resolver: StaticAssetResolver) -> Self {
        info!(root = %resolver.root().display(), prefix = resolver.prefix(), "static files enabled");
        self.assets = Some(resolver);
        self
    }

    fn add_spec(mut self, spec: RouteSpec) -> Self {
        for method in spec.methods {
            self.insert(&spec.path, method, Arc::clone(&spec.handler));
        }
        self
    }

    fn insert(&mut self, path: &str, method: Method, handler: BoxedHandler) {
        if self.routes.insert(path, method.clone(), handler).is_some() {
            debug!(%method, path, "route replaced");
        }
    }

    /// Every registered `(path, method)` pair, sorted.
    pub fn routes(&self) -> Vec<(String, Method)> {
        self.routes.routes()
    }

    pub fn route_table(&self) -> &RouteTable { &self.routes }
    pub fn pipeline(&self) -> &Pipeline { &self.pipeline }
    pub fn error_handlers(&self) -> &ErrorHandlers { &self.errors }
    pub fn static_assets(&self) -> Option<&StaticAssetResolver> { self.assets.as_ref() }

    /// Resolves one request to one response.
    pub fn handle(&self, req: Request) -> Response {
        match self.pipeline.run_before(&req) {
            Ok(Some(res)) => {
                debug!(method = %req.method(), path = req.path(), "short-circuited by middleware");
                return res;
            }
            Ok(None) => {}
            Err(err) => {
                error!(method = %req.method(), path = req.path(), "middleware failed: {err:#}");
                return self.errors.respond(StatusCode::INTERNAL_SERVER_ERROR, &req);
            }
        }

        let res = self.produce(&req);

        self.pipeline.run_after(&req, res, |err| {
            error!(method = %req.method(), path = req.path(), "middleware failed: {err:#}");
            self.errors.respond(StatusCode::INTERNAL_SERVER_ERROR, &req)
        })
    }

    /// Steps 2–4: static, route, 404.
    fn produce(&self, req: &Request) -> Response {
        if let Some(assets) = self.assets.as_ref().filter(|a| a.matches(req.path())) {
            if let Some(res) = assets.resolve(req.path()) {
                return res;
            }
            debug!(path = req.path(), "no static file, trying routes");
        }

        match self.routes.lookup(req.method(), req.path()) {
            Some(handler) => match guarded(|| handler.call(req)) {
                Ok(res) => res,
                Err(err) => {
                    error!(method = %req.method(), path = req.path(), "handler failed: {err:#}");
                    self.errors.respond(StatusCode::INTERNAL_SERVER_ERROR, req)
                }
            },
            None => {
                debug!(method = %req.method(), path = req.path(), "no route");
                self.errors.respond(StatusCode::NOT_FOUND, req)
            }
        }
    }
}

// ── SharedDispatcher ──────────────────────────────────────────────────────────

/// A dispatcher that can be replaced while requests are in flight.
///
/// Each request runs against the snapshot it loaded; `replace` and `update`
/// publish a whole new dispatcher and never mutate the one being read.
pub struct SharedDispatcher {
    current: ArcSwap<Dispatcher>,
}

impl SharedDispatcher {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { current: ArcSwap::from_pointee(dispatcher) }
    }

    pub fn handle(&self, req: Request) -> Response {
        self.current.load().handle(req)
    }

    /// The dispatcher new requests currently see.
    pub fn snapshot(&self) -> Arc<Dispatcher> {
        self.current.load_full()
    }

    pub fn replace(&self, dispatcher: Dispatcher) {
        self.current.store(Arc::new(dispatcher));
        info!("dispatcher replaced");
    }

    /// Copy-on-write change: `f` gets a copy of the current dispatcher and
    /// returns its successor. `f` may run more than once under contention.
    pub fn update<F>(&self, f: F)
    where
        F: Fn(Dispatcher) -> Dispatcher,
    {
        self.current.rcu(|current| f(Dispatcher::clone(current)));
        info!("dispatcher updated");
    }
}

impl From<Dispatcher> for SharedDispatcher {
    fn from(dispatcher: Dispatcher) -> Self {
        Self::new(dispatcher)
    }
}
