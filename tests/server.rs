use std::sync::Arc;

use easyapi::{Dispatcher, Request, Response, Server, SharedDispatcher};
use http::Method;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

async fn roundtrip(addr: std::net::SocketAddr, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();
    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();
    String::from_utf8_lossy(&out).into_owned()
}

#[tokio::test]
async fn serves_routes_and_404_over_tcp() {
    let app = Dispatcher::new()
        .add_route("/", |_req: &Request| Response::text("Welcome Home!"), [Method::GET])
        .add_route("/echo", |req: &Request| {
            let tag = req.query().get("tag").unwrap_or("-").to_owned();
            Response::text(format!("{tag}:{}", req.body_str().unwrap_or("")))
        }, [Method::POST]);
    let shared = Arc::new(SharedDispatcher::new(app));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(
        Server::bind("127.0.0.1:0").unwrap().serve_on(listener, Arc::clone(&shared), async move {
            let _ = stop_rx.await;
        }),
    );

    let home = roundtrip(addr, "GET / HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n").await;
    assert!(home.starts_with("HTTP/1.1 200 OK"), "{home}");
    assert!(home.ends_with("Welcome Home!"), "{home}");

    let echo = roundtrip(
        addr,
        "POST /echo?tag=t1 HTTP/1.1\r\nHost: test\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
    ).await;
    assert!(echo.ends_with("t1:hello"), "{echo}");

    let missing = roundtrip(addr, "GET /missing HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n").await;
    assert!(missing.starts_with("HTTP/1.1 404 Not Found"), "{missing}");
    assert!(missing.ends_with("404 Not Found"), "{missing}");

    // Routes swapped while serving are picked up by the next request.
    shared.update(|d| d.add_route("/late", |_req: &Request| "late", [Method::GET]));
    let late = roundtrip(addr, "GET /late HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n").await;
    assert!(late.ends_with("late"), "{late}");

    stop_tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}

#[test]
fn bind_rejects_bad_addresses() {
    assert!(Server::bind("127.0.0.1:8080").is_ok());
    let err = Server::bind("localhost").err().unwrap();
    assert!(err.to_string().contains("localhost"));
}
