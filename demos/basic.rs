//! easyapi example: routes, a blueprint, middleware, error pages, static
//! files and a handler backed by a cache.
//!
//! Run with:
//!   cargo run --example basic
//!
//! Try:
//!   curl http://localhost:5000/
//!   curl -X POST http://localhost:5000/greet -d 'Ada'
//!   curl http://localhost:5000/api/users
//!   curl -X POST http://localhost:5000/api/users/new -H "content-type: application/json" -d "{}"
//!   curl http://localhost:5000/cached_data
//!   curl http://localhost:5000/task_result?task_id=7
//!   curl http://localhost:5000/nowhere
//!
//! Optional: `easyapi.toml` in the working directory, e.g.
//!
//!   [server]
//!   addr = "0.0.0.0:5000"
//!   [static_files]
//!   root = "static"

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use easyapi::middleware::{trace, SetHeader};
use easyapi::services::{Cache, MemoryCache};
use easyapi::{
    Blueprint, Config, Dispatcher, Flow, Handler, HandlerResult, Middleware, Request, Resource,
    Response, RouteSpec, Server,
};
use http::{Method, StatusCode};

#[tokio::main]
async fn main() -> Result<(), easyapi::Error> {
    tracing_subscriber::fmt::init();

    let config = if Path::new("easyapi.toml").exists() {
        Config::load("easyapi.toml")?
    } else {
        Config::default()
    }
    .with_env_overrides();

    let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());

    let api = Blueprint::new("api")
        .route("/users", list_users)
        .route_with("/users/new", [Method::POST], create_user);

    let app = Dispatcher::from_config(&config)?
        .add_routes([
            RouteSpec::new("/", [Method::GET], home),
            RouteSpec::new("/about", [Method::GET], about),
            RouteSpec::new("/greet", [Method::POST], greet),
        ])
        .add_route_inferred("/task_result", get_task_result)
        .add_route("/cached_data", CachedData { cache: Arc::clone(&cache) }, [Method::GET])
        .add_route("/clear_cache", ClearCache { cache }, [Method::POST])
        .add_resource("/profile", Resource::new().get(|_req: &Request| "your profile"))
        .register_blueprint(&api, "/api")
        .use_middleware(trace())
        .use_middleware(Middleware::before(require_json_for_api_posts))
        .use_middleware(SetHeader::new("X-Custom-Header", "This is a custom header"))
        .register_error_handler(StatusCode::NOT_FOUND, |_req: &Request| {
            Response::builder().status(StatusCode::NOT_FOUND).text("Custom 404 Not Found")
        })
        .register_error_handler(StatusCode::INTERNAL_SERVER_ERROR, |_req: &Request| {
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .text("Custom 500 Internal Server Error")
        });

    Server::from_config(&config)?.serve(app).await
}

fn home(_req: &Request) -> Response {
    Response::text("Welcome to EasyAPI! This is the home page.")
}

fn about(_req: &Request) -> Response {
    Response::text("This is the About page.")
}

fn greet(req: &Request) -> Response {
    let name = req.body_str().filter(|s| !s.is_empty()).unwrap_or("Guest");
    Response::text(format!("Hello, {name}!"))
}

// `get_` prefix: registered for GET by add_route_inferred.
fn get_task_result(req: &Request) -> Response {
    let id = req.query().get("task_id").unwrap_or("");
    Response::text(format!("Task {id} - Status: PENDING, Result: None"))
}

fn list_users(_req: &Request) -> Response {
    Response::json(br#"[{"id":1,"name":"alice"}]"#.to_vec())
}

fn create_user(req: &Request) -> anyhow::Result<Response> {
    let name = req.body_str().ok_or_else(|| anyhow::anyhow!("body is not UTF-8"))?;
    Ok(Response::builder()
        .status(StatusCode::CREATED)
        .header("location", "/api/users/2")
        .json(format!(r#"{{"id":2,"raw":{name:?}}}"#).into_bytes()))
}

fn require_json_for_api_posts(req: &Request) -> Flow {
    let is_api_post = req.method() == Method::POST && req.path().starts_with("/api/");
    let is_json = req.header("content-type").is_some_and(|ct| ct.starts_with("application/json"));
    if is_api_post && !is_json {
        Flow::Override(Response::status(StatusCode::UNSUPPORTED_MEDIA_TYPE))
    } else {
        Flow::Continue
    }
}

struct CachedData {
    cache: Arc<dyn Cache>,
}

impl Handler for CachedData {
    fn call(&self, _req: &Request) -> HandlerResult {
        if let Some(hit) = self.cache.get("my_data")? {
            return Ok(Response::text(String::from_utf8(hit)?));
        }
        let data = "This is some cached data";
        self.cache.set("my_data", data.as_bytes().to_vec(), Duration::from_secs(600))?;
        Ok(Response::text(data))
    }
}

struct ClearCache {
    cache: Arc<dyn Cache>,
}

impl Handler for ClearCache {
    fn call(&self, _req: &Request) -> HandlerResult {
        self.cache.flush()?;
        Ok(Response::text("Cache cleared"))
    }
}
