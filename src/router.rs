//! Exact-match route table.
//!
//! One map per HTTP method, keyed by the literal path. No parameters, no
//! wildcards: `/users` and `/users/` are different routes. Registering the
//! same `(path, method)` twice keeps the second handler.

use std::collections::HashMap;

use http::Method;

use crate::handler::{boxed, handler_name, BoxedHandler, Handler};

/// The routing table: `(path, method) → handler`.
#[derive(Clone, Default)]
pub struct RouteTable {
    routes: HashMap<Method, HashMap<String, BoxedHandler>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `handler` for `(path, method)`, returning the handler it replaced.
    pub fn insert(&mut self, path: &str, method: Method, handler: BoxedHandler) -> Option<BoxedHandler> {
        self.routes
            .entry(method)
            .or_default()
            .insert(path.to_owned(), handler)
    }

    pub fn lookup(&self, method: &Method, path: &str) -> Option<&BoxedHandler> {
        self.routes.get(method)?.get(path)
    }

    /// Every `(path, method)` pair, sorted by path then method.
    pub fn routes(&self) -> Vec<(String, Method)> {
        let mut all: Vec<_> = self.routes.iter()
            .flat_map(|(method, tree)| tree.keys().map(move |path| (path.clone(), method.clone())))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.as_str().cmp(b.1.as_str())));
        all
    }

    pub fn len(&self) -> usize {
        self.routes.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── RouteSpec ─────────────────────────────────────────────────────────────────

/// A registration descriptor: path, methods and the handler serving them.
///
/// Built up front and handed to [`Dispatcher::add_routes`](crate::Dispatcher::add_routes).
/// Tuples convert into it, so both a list of triples and a map of
/// `path → (handler, methods)` can be registered directly.
#[derive(Clone)]
pub struct RouteSpec {
    pub(crate) path: String,
    pub(crate) methods: Vec<Method>,
    pub(crate) handler: BoxedHandler,
}

impl RouteSpec {
    pub fn new(
        path: impl Into<String>,
        methods: impl IntoIterator<Item = Method>,
        handler: impl Handler,
    ) -> Self {
        Self {
            path: path.into(),
            methods: methods.into_iter().collect(),
            handler: boxed(handler),
        }
    }

    /// Descriptor whose methods come from the handler's declared name (see [`infer_methods`]).
    pub fn inferred<H: Handler>(path: impl Into<String>, handler: H) -> Self {
        Self {
            path: path.into(),
            methods: infer_methods(handler_name::<H>()),
            handler: boxed(handler),
        }
    }

    pub fn path(&self) -> &str { &self.path }
    pub fn methods(&self) -> &[Method] { &self.methods }
}

impl<P, M> From<(P, BoxedHandler, M)> for RouteSpec
where
    P: Into<String>,
    M: IntoIterator<Item = Method>,
{
    fn from((path, handler, methods): (P, BoxedHandler, M)) -> Self {
        Self { path: path.into(), methods: methods.into_iter().collect(), handler }
    }
}

impl<P, M> From<(P, (BoxedHandler, M))> for RouteSpec
where
    P: Into<String>,
    M: IntoIterator<Item = Method>,
{
    fn from((path, (handler, methods)): (P, (BoxedHandler, M))) -> Self {
        Self::from((path, handler, methods))
    }
}

// ── Method inference ──────────────────────────────────────────────────────────

/// Derives methods from a handler name by prefix.
///
/// `get_` → GET, `post_` → POST, `put_` → PUT, `delete_` → DELETE, anything
/// else → GET. An opt-in convenience; explicit method lists are the primary
/// registration path.
///
/// ```rust
/// use easyapi::infer_methods;
/// use http::Method;
///
/// assert_eq!(infer_methods("post_greet"), [Method::POST]);
/// assert_eq!(infer_methods("about"), [Method::GET]);
/// ```
pub fn infer_methods(name: &str) -> Vec<Method> {
    const PREFIXES: [(&str, Method); 4] = [
        ("get_", Method::GET),
        ("post_", Method::POST),
        ("put_", Method::PUT),
        ("delete_", Method::DELETE),
    ];
    let method = PREFIXES.iter()
        .find(|(prefix, _)| name.starts_with(prefix))
        .map(|(_, method)| method.clone())
        .unwrap_or(Method::GET);
    vec![method]
}
