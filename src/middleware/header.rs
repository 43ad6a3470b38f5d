//! Response header injection.

use crate::middleware::{After, Flow, Middleware};
use crate::request::Request;
use crate::response::Response;

/// After-middleware that appends a fixed header to every response.
///
/// Existing headers with the same name are kept; the new one is added last.
#[derive(Clone, Debug)]
pub struct SetHeader {
    name: String,
    value: String,
}

impl SetHeader {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

impl After for SetHeader {
    fn after(&self, _req: &Request, res: &Response) -> anyhow::Result<Flow> {
        Ok(Flow::Override(res.clone().with_header(&self.name, &self.value)))
    }
}

impl From<SetHeader> for Middleware {
    fn from(mw: SetHeader) -> Self {
        Middleware::after(mw)
    }
}
