//! Blueprints: named route groups merged under a prefix.
//!
//! A blueprint collects routes relative to its own root. Registering it on a
//! [`Dispatcher`](crate::Dispatcher) copies every entry once, prefixing each
//! path; routes added to the blueprint afterwards are not seen by that
//! dispatcher.
//!
//! ```rust
//! use easyapi::{Blueprint, Dispatcher, Request, Response};
//! use http::Method;
//!
//! let api = Blueprint::new("api")
//!     .route("/users", |_req: &Request| Response::text("users"))
//!     .route_with("/users/new", [Method::POST], |_req: &Request| Response::text("created"));
//!
//! let app = Dispatcher::new().register_blueprint(&api, "/api");
//! let res = app.handle(Request::new(Method::GET, "/api/users"));
//! assert_eq!(res.body(), b"users");
//! let res = app.handle(Request::new(Method::POST, "/api/users/new"));
//! assert_eq!(res.body(), b"created");
//! ```
//!
//! Each local path holds one entry: calling `route` or `route_with` again for
//! the same path replaces its handler *and* its methods. To serve several
//! verbs from one path, pass them all to a single `route_with`.

use std::collections::BTreeMap;

use http::Method;

use crate::handler::{boxed, BoxedHandler, Handler};
use crate::router::RouteSpec;

/// A named group of routes sharing a path prefix.
#[derive(Clone)]
pub struct Blueprint {
    name: String,
    handlers: BTreeMap<String, BoxedHandler>,
    methods: BTreeMap<String, Vec<Method>>,
}

impl Blueprint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handlers: BTreeMap::new(),
            methods: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a `GET` route at `path`, relative to the blueprint's prefix.
    pub fn route(self, path: &str, handler: impl Handler) -> Self {
        self.route_with(path, [Method::GET], handler)
    }

    /// Adds a route for the given methods. Reusing a local path replaces both
    /// its handler and its method list.
    pub fn route_with(
        mut self,
        path: &str,
        methods: impl IntoIterator<Item = Method>,
        handler: impl Handler,
    ) -> Self {
        let mut methods: Vec<Method> = methods.into_iter().collect();
        if methods.is_empty() {
            methods.push(Method::GET);
        }
        self.handlers.insert(path.to_owned(), boxed(handler));
        self.methods.insert(path.to_owned(), methods);
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// The entries as global route descriptors under `prefix`.
    pub(crate) fn specs(&self, prefix: &str) -> Vec<RouteSpec> {
        self.handlers.iter()
            .map(|(path, handler)| {
                let methods = self.methods.get(path).cloned().unwrap_or_else(|| vec![Method::GET]);
                RouteSpec::from((format!("{prefix}{path}"), handler.clone(), methods))
            })
            .collect()
    }
}
