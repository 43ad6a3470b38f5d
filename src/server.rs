//! HTTP transport and graceful shutdown.
//!
//! The server is a thin adapter: it turns each hyper request into a
//! [`Request`], hands it to the dispatcher on tokio's blocking pool (handlers
//! and static reads are synchronous), and writes the [`Response`] back.
//!
//! # Graceful shutdown
//!
//! On **SIGTERM** or **Ctrl-C** the server:
//! 1. stops `listener.accept()` immediately, so no new connections are made;
//! 2. lets every in-flight connection task run to completion;
//! 3. returns from [`Server::serve`], which lets `main` exit cleanly.
//!
//! # Request bodies
//!
//! Bodies are buffered in full before dispatch, up to
//! [`Server::with_max_body`] bytes ([`DEFAULT_MAX_BODY`] unless configured).
//! A larger body is answered with `413 Payload Too Large` and never reaches
//! the dispatcher.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::dispatcher::{Dispatcher, SharedDispatcher};
use crate::error::Error;
use crate::error_handler::default_response;
use crate::request::Request;

/// Largest request body buffered by default: 1 MiB.
pub const DEFAULT_MAX_BODY: usize = 1024 * 1024;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    max_body: usize,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// ```rust
    /// use easyapi::Server;
    ///
    /// assert!(Server::bind("0.0.0.0:3000").is_ok());
    /// assert!(Server::bind("not an address").is_err());
    /// ```
    pub fn bind(addr: &str) -> Result<Self, Error> {
        let addr = addr.parse().map_err(|source| Error::InvalidAddress {
            addr: addr.to_owned(),
            source,
        })?;
        Ok(Self { addr, max_body: DEFAULT_MAX_BODY })
    }

    pub fn from_config(config: &Config) -> Result<Self, Error> {
        Ok(Self::bind(&config.server.addr)?.with_max_body(config.server.max_body_bytes))
    }

    /// Caps the request body size; larger bodies get a 413.
    pub fn with_max_body(mut self, bytes: usize) -> Self {
        self.max_body = bytes;
        self
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn max_body(&self) -> usize {
        self.max_body
    }

    /// Serves `dispatcher` until a shutdown signal arrives and every
    /// in-flight request has completed.
    pub async fn serve(self, dispatcher: Dispatcher) -> Result<(), Error> {
        self.serve_shared(Arc::new(SharedDispatcher::new(dispatcher))).await
    }

    /// Like [`serve`](Server::serve), for a dispatcher the caller may replace
    /// while the server runs.
    pub async fn serve_shared(self, app: Arc<SharedDispatcher>) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve_on(listener, app, shutdown_signal()).await
    }

    /// Accept loop over an already bound listener, stopping when `shutdown`
    /// resolves.
    pub async fn serve_on(
        self,
        listener: TcpListener,
        app: Arc<SharedDispatcher>,
        shutdown: impl std::future::Future<Output = ()>,
    ) -> Result<(), Error> {
        let local = listener.local_addr()?;
        let snapshot = app.snapshot();
        info!(addr = %local, routes = snapshot.routes().len(), "easyapi listening");
        for (path, method) in snapshot.routes() {
            info!(%method, path = %path, "route");
        }
        drop(snapshot);

        // JoinSet tracks every spawned connection task so we can wait for
        // them all to finish during graceful shutdown.
        let max_body = self.max_body;
        let mut tasks = tokio::task::JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check shutdown first so a SIGTERM stops accepting at once,
                // even if more connections are queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let app = Arc::clone(&app);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection, not once per connection.
                        let svc = service_fn(move |req| {
                            let app = Arc::clone(&app);
                            async move { dispatch(app, req, max_body).await }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("easyapi stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Routes one hyper request and produces one hyper response.
///
/// The error type is [`Infallible`]: every failure is already a response by
/// the time it gets here, so hyper never sees an error.
async fn dispatch(
    app: Arc<SharedDispatcher>,
    req: hyper::Request<Incoming>,
    max_body: usize,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = match read_body(body, max_body).await {
        Ok(bytes) => bytes,
        Err(status) => {
            warn!(path = parts.uri.path(), status = status.as_u16(), "request body rejected");
            return Ok(default_response(status).into_http());
        }
    };
    let request = Request::from_parts(&parts, body.to_vec());

    let response = match tokio::task::spawn_blocking(move || app.handle(request)).await {
        Ok(response) => response,
        Err(e) => {
            error!(path = parts.uri.path(), "dispatch task failed: {e}");
            default_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    };

    Ok(response.into_http())
}

/// Buffers at most `limit` bytes of `body`. Over the limit is a 413; any other
/// read failure is a 400.
async fn read_body<B>(body: B, limit: usize) -> Result<Bytes, StatusCode>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => Err(StatusCode::PAYLOAD_TOO_LARGE),
        Err(e) => {
            warn!("failed to read request body: {e}");
            Err(StatusCode::BAD_REQUEST)
        }
    }
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives: SIGTERM or
/// SIGINT on Unix, Ctrl-C elsewhere. A signal that cannot be installed is
/// logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
