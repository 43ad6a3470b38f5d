//! # easyapi
//!
//! A small request dispatch framework. Nothing more. Nothing less.
//!
//! ## The contract
//!
//! One call to [`Dispatcher::handle`] turns one [`Request`] into one
//! [`Response`], in a fixed order:
//!
//! 1. before-middleware (the first override wins and ends the request);
//! 2. static files under the configured prefix;
//! 3. exact `(path, method)` routes;
//! 4. the 404 handler;
//! 5. after-middleware, each free to replace the response.
//!
//! Handler failures become the 500 handler's response. Nothing raised inside
//! a request escapes `handle`.
//!
//! What easyapi leaves to others:
//!
//! - **Path parameters and wildcards**: routes are literal paths
//! - **Content negotiation**: handlers pick their own content type
//! - **TLS**: terminate it in front of the server
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use easyapi::{Blueprint, Dispatcher, Request, Response, Server};
//! use http::Method;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), easyapi::Error> {
//!     let api = Blueprint::new("api")
//!         .route("/users", list_users)
//!         .route_with("/users/new", [Method::POST], create_user);
//!
//!     let app = Dispatcher::new()
//!         .add_route("/", |_req: &Request| Response::text("Welcome Home!"), [Method::GET])
//!         .register_blueprint(&api, "/api")
//!         .use_middleware(easyapi::middleware::trace())
//!         .set_static_folder("static")?;
//!
//!     Server::bind("0.0.0.0:5000")?.serve(app).await
//! }
//!
//! fn list_users(_req: &Request) -> Response {
//!     Response::json(br#"[{"id":1}]"#.to_vec())
//! }
//!
//! fn create_user(req: &Request) -> anyhow::Result<Response> {
//!     let name = req.form().get("name").map(str::to_owned);
//!     let name = name.ok_or_else(|| anyhow::anyhow!("missing name"))?;
//!     Ok(Response::builder()
//!         .status(http::StatusCode::CREATED)
//!         .json(format!(r#"{{"name":"{name}"}}"#).into_bytes()))
//! }
//! ```

mod blueprint;
mod config;
mod dispatcher;
mod error;
mod error_handler;
mod handler;
mod request;
mod resource;
mod response;
mod router;
mod server;
mod static_files;

pub mod middleware;
pub mod services;

pub use blueprint::Blueprint;
pub use config::{Config, ServerConfig, StaticConfig};
pub use dispatcher::{Dispatcher, SharedDispatcher};
pub use error::Error;
pub use error_handler::{default_response, ErrorHandlers};
pub use handler::{boxed, handler_name, BoxedHandler, Handler, HandlerResult, IntoHandlerResult};
pub use middleware::{Flow, IntoFlow, Middleware};
pub use request::{Headers, QueryParams, Request};
pub use resource::Resource;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::{infer_methods, RouteSpec, RouteTable};
pub use server::{Server, DEFAULT_MAX_BODY};
pub use static_files::{StaticAssetResolver, DEFAULT_PREFIX};
