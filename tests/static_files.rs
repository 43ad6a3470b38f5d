use std::fs;

use easyapi::{Dispatcher, Error, Middleware, Request, Response, StaticAssetResolver};
use http::{Method, StatusCode};

fn static_root() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("foo.txt"), b"foo bytes\n").unwrap();
    fs::write(dir.path().join("logo.png"), [0x89, b'P', b'N', b'G', 0x00, 0xff]).unwrap();
    dir
}

fn get(path: &str) -> Request {
    Request::new(Method::GET, path)
}

#[test]
fn existing_file_is_served_byte_for_byte() {
    let root = static_root();
    let app = Dispatcher::new().set_static_folder(root.path()).unwrap();

    let res = app.handle(get("/static/foo.txt"));
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(res.body(), b"foo bytes\n");

    let res = app.handle(get("/static/logo.png"));
    assert_eq!(res.body(), [0x89, b'P', b'N', b'G', 0x00, 0xff]);
    assert_eq!(res.header("content-type"), Some("image/png"));
}

#[test]
fn missing_file_falls_through_to_404() {
    let root = static_root();
    let app = Dispatcher::new().set_static_folder(root.path()).unwrap();

    let res = app.handle(get("/static/absent.txt"));
    assert_eq!(res.status_line(), "404 NOT FOUND");
    assert_eq!(res.body(), b"404 Not Found");
}

#[test]
fn missing_file_uses_registered_404() {
    let root = static_root();
    let app = Dispatcher::new()
        .set_static_folder(root.path())
        .unwrap()
        .register_error_handler(StatusCode::NOT_FOUND, |req: &Request| {
            Response::builder()
                .status(StatusCode::NOT_FOUND)
                .text(format!("no asset at {}", req.path()))
        });

    assert_eq!(app.handle(get("/static/absent.txt")).body(), b"no asset at /static/absent.txt");
}

#[test]
fn static_file_beats_a_route_on_the_same_path() {
    let root = static_root();
    let app = Dispatcher::new()
        .add_route("/static/foo.txt", |_req: &Request| "from route", [Method::GET])
        .add_route("/static/generated.txt", |_req: &Request| "generated", [Method::GET])
        .set_static_folder(root.path())
        .unwrap();

    assert_eq!(app.handle(get("/static/foo.txt")).body(), b"foo bytes\n");
    // No file: the route table still gets its turn before 404.
    assert_eq!(app.handle(get("/static/generated.txt")).body(), b"generated");
}

#[test]
fn before_middleware_beats_static() {
    let root = static_root();
    let app = Dispatcher::new()
        .set_static_folder(root.path())
        .unwrap()
        .use_middleware(Middleware::before(|_req: &Request| {
            Some(Response::status(StatusCode::UNAUTHORIZED))
        }));
    assert_eq!(app.handle(get("/static/foo.txt")).status_code(), StatusCode::UNAUTHORIZED);
}

#[test]
fn after_middleware_sees_static_responses() {
    let root = static_root();
    let app = Dispatcher::new()
        .set_static_folder(root.path())
        .unwrap()
        .use_middleware(easyapi::middleware::SetHeader::new("cache-control", "max-age=60"));
    let res = app.handle(get("/static/foo.txt"));
    assert_eq!(res.header("cache-control"), Some("max-age=60"));
    assert_eq!(res.body(), b"foo bytes\n");
}

#[test]
fn traversal_never_leaves_the_root() {
    let outer = tempfile::tempdir().unwrap();
    fs::write(outer.path().join("secret.txt"), b"secret").unwrap();
    let public = outer.path().join("public");
    fs::create_dir(&public).unwrap();

    let app = Dispatcher::new().set_static_folder(&public).unwrap();
    for path in ["/static/../secret.txt", "/static/%2e%2e/secret.txt", "/static/a/../../secret.txt"] {
        let req = Request::new(Method::GET, path);
        let res = app.handle(req);
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND, "{path}");
        assert_ne!(res.body(), b"secret");
    }
}

#[test]
fn custom_prefix() {
    let root = static_root();
    let resolver = StaticAssetResolver::new(root.path()).unwrap().with_prefix("/assets/");
    let app = Dispatcher::new().set_static(resolver);

    assert_eq!(app.handle(get("/assets/foo.txt")).body(), b"foo bytes\n");
    assert_eq!(app.handle(get("/static/foo.txt")).status_code(), StatusCode::NOT_FOUND);
}

#[test]
fn no_static_folder_means_no_interception() {
    let app = Dispatcher::new().add_route("/static/foo.txt", |_req: &Request| "route", [Method::GET]);
    assert_eq!(app.handle(get("/static/foo.txt")).body(), b"route");
}

#[test]
fn misconfigured_folder_is_a_setup_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Dispatcher::new().set_static_folder(dir.path().join("nope")).err().unwrap();
    assert!(matches!(err, Error::StaticFolderMisconfigured { .. }));
}
