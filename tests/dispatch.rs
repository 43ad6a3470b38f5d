use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use easyapi::middleware::SetHeader;
use easyapi::{boxed, Blueprint, Dispatcher, Flow, Middleware, Request, Resource, Response, RouteSpec};
use http::{Method, StatusCode};

fn get(path: &str) -> Request {
    Request::new(Method::GET, path)
}

fn get_home(_req: &Request) -> Response {
    Response::text("Welcome Home!")
}

fn post_greet(req: &Request) -> Response {
    let name = req.body_str().filter(|s| !s.is_empty()).unwrap_or("Guest");
    Response::text(format!("Hello, {name}!"))
}

fn delete_session(_req: &Request) -> StatusCode {
    StatusCode::NO_CONTENT
}

#[test]
fn home_route_end_to_end() {
    let app = Dispatcher::new().add_route("/", get_home, [Method::GET]);

    let res = app.handle(get("/"));
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(res.status_line(), "200 OK");
    assert_eq!(res.body(), b"Welcome Home!");

    let res = app.handle(get("/missing"));
    assert_eq!(res.body(), b"404 Not Found");
    assert_eq!(res.status_line(), "404 NOT FOUND");
}

#[test]
fn second_registration_wins() {
    let app = Dispatcher::new()
        .add_route("/dup", |_req: &Request| "first", [Method::GET])
        .add_route("/dup", |_req: &Request| "second", [Method::GET]);
    assert_eq!(app.handle(get("/dup")).body(), b"second");
    assert_eq!(app.routes().len(), 1);
}

#[test]
fn methods_are_part_of_the_key() {
    let app = Dispatcher::new()
        .add_route("/greet", post_greet, [Method::POST])
        .add_route("/multi", |_req: &Request| "either", [Method::GET, Method::PUT]);

    let res = app.handle(Request::new(Method::POST, "/greet").with_body("Ada"));
    assert_eq!(res.body(), b"Hello, Ada!");
    assert_eq!(app.handle(get("/greet")).status_code(), StatusCode::NOT_FOUND);
    assert_eq!(app.handle(Request::new(Method::PUT, "/multi")).body(), b"either");
    assert_eq!(app.handle(Request::new(Method::DELETE, "/multi")).status_code(), StatusCode::NOT_FOUND);
}

#[test]
fn add_routes_accepts_triples_and_maps() {
    let triples = vec![
        RouteSpec::new("/", [Method::GET], get_home),
        RouteSpec::new("/about", [Method::GET], |_req: &Request| "This is the About page."),
        RouteSpec::from(("/greet", boxed(post_greet), [Method::POST])),
    ];
    let mut map = BTreeMap::new();
    map.insert("/bye", (boxed(|_req: &Request| "bye"), vec![Method::GET, Method::POST]));

    let app = Dispatcher::new().add_routes(triples).add_routes(map);

    assert_eq!(app.handle(get("/about")).body(), b"This is the About page.");
    assert_eq!(app.handle(Request::new(Method::POST, "/greet")).body(), b"Hello, Guest!");
    assert_eq!(app.handle(Request::new(Method::POST, "/bye")).body(), b"bye");
    assert_eq!(app.routes().len(), 5);
}

#[test]
fn inferred_routes_use_handler_names() {
    let app = Dispatcher::new()
        .add_route_inferred("/", get_home)
        .add_route_inferred("/greet", post_greet)
        .add_route_inferred("/session", delete_session)
        .add_route_inferred("/anon", |_req: &Request| "closure");

    assert_eq!(app.routes(), [
        ("/".to_owned(), Method::GET),
        ("/anon".to_owned(), Method::GET),
        ("/greet".to_owned(), Method::POST),
        ("/session".to_owned(), Method::DELETE),
    ]);
    let res = app.handle(Request::new(Method::DELETE, "/session"));
    assert_eq!(res.status_code(), StatusCode::NO_CONTENT);
}

#[test]
fn blueprint_is_reachable_under_prefix() {
    let users = Blueprint::new("users").route("/users", |_req: &Request| "user list");
    let app = Dispatcher::new().register_blueprint(&users, "/api");

    assert_eq!(app.handle(get("/api/users")).body(), b"user list");
    assert_eq!(app.handle(get("/users")).status_code(), StatusCode::NOT_FOUND);
    assert_eq!(
        app.handle(Request::new(Method::POST, "/api/users")).status_code(),
        StatusCode::NOT_FOUND,
    );
}

#[test]
fn blueprint_list_and_create_on_separate_paths() {
    let api = Blueprint::new("api")
        .route("/users", |_req: &Request| "user list")
        .route_with("/users/new", [Method::POST], |_req: &Request| "created");
    let app = Dispatcher::new().register_blueprint(&api, "/api");

    assert_eq!(app.handle(get("/api/users")).body(), b"user list");
    assert_eq!(app.handle(Request::new(Method::POST, "/api/users/new")).body(), b"created");
}

#[test]
fn blueprint_path_reused_keeps_only_the_last_entry() {
    let api = Blueprint::new("api")
        .route("/users", |_req: &Request| "user list")
        .route_with("/users", [Method::POST], |_req: &Request| "created");
    let app = Dispatcher::new().register_blueprint(&api, "/api");

    assert_eq!(app.handle(get("/api/users")).status_code(), StatusCode::NOT_FOUND);
    assert_eq!(app.handle(Request::new(Method::POST, "/api/users")).body(), b"created");
}

#[test]
fn blueprint_changes_after_registration_are_not_seen() {
    let bp = Blueprint::new("admin").route("/stats", |_req: &Request| "stats");
    let app = Dispatcher::new().register_blueprint(&bp, "/admin");

    let bp = bp
        .route("/stats", |_req: &Request| "changed")
        .route("/late", |_req: &Request| "late");
    assert_eq!(bp.len(), 2);

    assert_eq!(app.handle(get("/admin/stats")).body(), b"stats");
    assert_eq!(app.handle(get("/admin/late")).status_code(), StatusCode::NOT_FOUND);
}

#[test]
fn one_blueprint_under_two_prefixes() {
    let bp = Blueprint::new("v").route("/ping", |_req: &Request| "pong");
    let app = Dispatcher::new()
        .register_blueprint(&bp, "/v1")
        .register_blueprint(&bp, "/v2");
    assert_eq!(app.handle(get("/v1/ping")).body(), b"pong");
    assert_eq!(app.handle(get("/v2/ping")).body(), b"pong");
}

#[test]
fn before_override_skips_everything_else() {
    let route_hits = Arc::new(AtomicUsize::new(0));
    let b_hits = Arc::new(AtomicUsize::new(0));
    let after_hits = Arc::new(AtomicUsize::new(0));

    let app = {
        let route_hits = Arc::clone(&route_hits);
        let b_hits = Arc::clone(&b_hits);
        let after_hits = Arc::clone(&after_hits);
        Dispatcher::new()
            .add_route("/", move |_req: &Request| {
                route_hits.fetch_add(1, Ordering::SeqCst);
                "home"
            }, [Method::GET])
            .use_middleware(Middleware::before(|_req: &Request| {
                Flow::Override(Response::builder().status(StatusCode::FORBIDDEN).text("denied"))
            }))
            .use_middleware(Middleware::before(move |_req: &Request| {
                b_hits.fetch_add(1, Ordering::SeqCst);
            }))
            .use_middleware(Middleware::after(move |_req: &Request, _res: &Response| {
                after_hits.fetch_add(1, Ordering::SeqCst);
            }))
    };

    let res = app.handle(get("/"));
    assert_eq!(res.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(res.body(), b"denied");
    assert_eq!(route_hits.load(Ordering::SeqCst), 0);
    assert_eq!(b_hits.load(Ordering::SeqCst), 0);
    assert_eq!(after_hits.load(Ordering::SeqCst), 0);
}

#[test]
fn before_that_continues_lets_routing_happen() {
    let app = Dispatcher::new()
        .add_route("/", get_home, [Method::GET])
        .use_middleware(easyapi::middleware::trace())
        .use_middleware(Middleware::before(|req: &Request| {
            (req.header("x-block").is_some())
                .then(|| Response::status(StatusCode::TOO_MANY_REQUESTS))
        }));
    assert_eq!(app.handle(get("/")).body(), b"Welcome Home!");
    assert_eq!(
        app.handle(get("/").with_header("X-Block", "1")).status_code(),
        StatusCode::TOO_MANY_REQUESTS,
    );
}

#[test]
fn after_chain_overrides_in_order() {
    let m1 = |_req: &Request, _res: &Response| Some(Response::text("R1"));
    let m2_silent = |_req: &Request, _res: &Response| None::<Response>;
    let m2_loud = |_req: &Request, _res: &Response| Some(Response::text("R2"));

    let app = Dispatcher::new()
        .add_route("/", get_home, [Method::GET])
        .use_middleware(Middleware::after(m1))
        .use_middleware(Middleware::after(m2_silent));
    assert_eq!(app.handle(get("/")).body(), b"R1");

    let app = Dispatcher::new()
        .add_route("/", get_home, [Method::GET])
        .use_middleware(Middleware::after(m1))
        .use_middleware(Middleware::after(m2_loud));
    assert_eq!(app.handle(get("/")).body(), b"R2");
}

#[test]
fn after_middleware_sees_the_current_response() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = Arc::clone(&seen);
    let app = Dispatcher::new()
        .add_route("/", get_home, [Method::GET])
        .use_middleware(SetHeader::new("X-Custom-Header", "This is a custom header"))
        .use_middleware(Middleware::after(move |_req: &Request, res: &Response| {
            record.lock().unwrap().push(res.header("x-custom-header").map(str::to_owned));
        }));

    let res = app.handle(get("/"));
    assert_eq!(res.header("X-Custom-Header"), Some("This is a custom header"));
    assert_eq!(res.body(), b"Welcome Home!");
    assert_eq!(*seen.lock().unwrap(), [Some("This is a custom header".to_owned())]);
}

#[test]
fn after_middleware_runs_on_404_and_500() {
    let app = Dispatcher::new()
        .add_route("/boom", |_req: &Request| -> Response { panic!("handler exploded") }, [Method::GET])
        .use_middleware(SetHeader::new("x-seen", "1"));

    let res = app.handle(get("/nowhere"));
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(res.header("x-seen"), Some("1"));

    let res = app.handle(get("/boom"));
    assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.header("x-seen"), Some("1"));
}

#[test]
fn failing_handlers_become_500() {
    let app = Dispatcher::new()
        .add_route("/panic", |_req: &Request| -> Response { panic!("oops") }, [Method::GET])
        .add_route("/err", |_req: &Request| -> anyhow::Result<Response> {
            anyhow::bail!("database unreachable")
        }, [Method::GET]);

    for path in ["/panic", "/err"] {
        let res = app.handle(get(path));
        assert_eq!(res.status_line(), "500 INTERNAL SERVER ERROR");
        assert_eq!(res.body(), b"500 Internal Server Error");
    }
}

#[test]
fn registered_error_handlers_replace_defaults() {
    let app = Dispatcher::new()
        .add_route("/err", |_req: &Request| -> Result<Response, std::io::Error> {
            Err(std::io::Error::other("disk full"))
        }, [Method::GET])
        .register_error_handler(StatusCode::NOT_FOUND, |_req: &Request| {
            Response::builder().status(StatusCode::NOT_FOUND).text("Custom 404 Not Found")
        })
        .register_error_handler(StatusCode::INTERNAL_SERVER_ERROR, |_req: &Request| {
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .text("Custom 500 Internal Server Error")
        });

    let res = app.handle(get("/nope"));
    assert_eq!(res.body(), b"Custom 404 Not Found");
    assert_eq!(res.status_line(), "404 NOT FOUND");

    let res = app.handle(get("/err"));
    assert_eq!(res.body(), b"Custom 500 Internal Server Error");
}

#[test]
fn resource_without_a_verb_is_404_not_empty() {
    let app = Dispatcher::new().add_resource(
        "/things",
        Resource::new().get(|_req: &Request| "things").put(|_req: &Request| "updated"),
    );
    assert_eq!(app.handle(get("/things")).body(), b"things");
    assert_eq!(app.handle(Request::new(Method::PUT, "/things")).body(), b"updated");

    let res = app.handle(Request::new(Method::DELETE, "/things"));
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(res.body(), b"404 Not Found");
}

#[test]
fn query_and_headers_reach_handlers() {
    let app = Dispatcher::new().add_route("/task_result", |req: &Request| {
        let id = req.query().get("task_id").unwrap_or("");
        let tags = req.query().get_all("tag").join(",");
        let agent = req.header("user_agent").unwrap_or("-");
        format!("task={id} tags={tags} agent={agent}")
    }, [Method::GET]);

    let req = get("/task_result?task_id=42&tag=a&tag=b").with_header("User-Agent", "curl");
    assert_eq!(app.handle(req).body(), b"task=42 tags=a,b agent=curl");
}

#[test]
fn dispatcher_is_shared_across_threads() {
    let app = Arc::new(
        Dispatcher::new().add_route("/n", |req: &Request| {
            req.query().get("n").unwrap_or("?").to_owned()
        }, [Method::GET]),
    );

    let workers: Vec<_> = (0..8)
        .map(|i| {
            let app = Arc::clone(&app);
            std::thread::spawn(move || app.handle(get(&format!("/n?n={i}"))).body().to_vec())
        })
        .collect();

    for (i, worker) in workers.into_iter().enumerate() {
        assert_eq!(worker.join().unwrap(), i.to_string().into_bytes());
    }
}
