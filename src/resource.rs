//! RESTful resources with an explicit set of verbs.
//!
//! A [`Resource`] groups the handlers of one path by verb. Only the verbs
//! that were given a handler are registered; a verb the resource does not
//! declare is simply absent from the route table, so the request falls
//! through to the 404 path instead of hitting an empty default.
//!
//! ```rust
//! use easyapi::{Dispatcher, Request, Resource, Response};
//! use http::Method;
//!
//! let users = Resource::new()
//!     .get(|_req: &Request| Response::text("all users"))
//!     .post(|_req: &Request| Response::text("created"));
//! assert_eq!(users.methods(), [Method::GET, Method::POST]);
//!
//! let app = Dispatcher::new().add_resource("/users", users);
//! # let _ = app;
//! ```

use http::Method;

use crate::handler::{boxed, BoxedHandler, Handler};

/// Verb → handler capability set for a single path.
#[derive(Clone, Default)]
pub struct Resource {
    verbs: Vec<(Method, BoxedHandler)>,
}

impl Resource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(self, handler: impl Handler) -> Self {
        self.on(Method::GET, handler)
    }

    pub fn post(self, handler: impl Handler) -> Self {
        self.on(Method::POST, handler)
    }

    pub fn put(self, handler: impl Handler) -> Self {
        self.on(Method::PUT, handler)
    }

    pub fn delete(self, handler: impl Handler) -> Self {
        self.on(Method::DELETE, handler)
    }

    // Declaring a verb twice keeps the latest handler, like the route table.
    fn on(mut self, method: Method, handler: impl Handler) -> Self {
        let handler = boxed(handler);
        match self.verbs.iter_mut().find(|(m, _)| *m == method) {
            Some(slot) => slot.1 = handler,
            None => self.verbs.push((method, handler)),
        }
        self
    }

    /// The declared verbs, in declaration order.
    pub fn methods(&self) -> Vec<Method> {
        self.verbs.iter().map(|(m, _)| m.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.verbs.is_empty()
    }

    pub(crate) fn into_verbs(self) -> impl Iterator<Item = (Method, BoxedHandler)> {
        self.verbs.into_iter()
    }
}
