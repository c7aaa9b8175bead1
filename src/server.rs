//! HTTP server and graceful shutdown.
//!
//! # Graceful shutdown
//!
//! On **SIGTERM** or **Ctrl-C** (or when the future handed to
//! [`Server::serve_with_shutdown`] resolves) the server:
//! 1. Stops calling `listener.accept()`, so no new connections are made.
//! 2. Lets every in-flight connection task run to completion.
//! 3. Returns from `serve`, which lets `main` exit cleanly.
//!
//! A handler that panics with no [`Recovery`](crate::middleware::Recovery)
//! in the chain takes down its own connection task and nothing else.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::task::JoinError;
use tracing::{error, info};

use crate::app::App;
use crate::error::{ApiError, Error};
use crate::handler::BoxedEndpoint;
use crate::method::Method;
use crate::request::{PeerAddr, Request};
use crate::response::IntoResponse;

/// The HTTP server.
pub struct Server {
    listener: TcpListener,
}

impl Server {
    /// Binds a listener on `addr`.
    ///
    /// ```rust,no_run
    /// use tollgate::Server;
    /// # async fn run() -> Result<(), tollgate::Error> {
    /// let server = Server::bind("0.0.0.0:3000").await?;
    /// # Ok(()) }
    /// ```
    pub async fn bind(addr: &str) -> Result<Self, Error> {
        Ok(Self { listener: TcpListener::bind(addr).await? })
    }

    /// Serves on a listener that is already bound, e.g. `127.0.0.1:0` in tests.
    pub fn from_listener(listener: TcpListener) -> Self {
        Self { listener }
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections and dispatches them through `app` until SIGTERM or
    /// Ctrl-C, then drains in-flight connections.
    pub async fn serve(self, app: App) -> Result<(), Error> {
        self.serve_with_shutdown(app, shutdown_signal()).await
    }

    /// Like [`serve`](Self::serve), but stops when `signal` resolves.
    pub async fn serve_with_shutdown(
        self,
        app: App,
        signal: impl Future<Output = ()> + Send,
    ) -> Result<(), Error> {
        let addr = self.local_addr()?;
        let endpoint = app.endpoint();

        info!(%addr, "tollgate listening");

        let mut tasks = tokio::task::JoinSet::new();

        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Shutdown first, so a signal stops accepting even with
                // connections queued.
                biased;

                () = &mut signal => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = self.listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let endpoint = endpoint.clone();
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection.
                        let svc = service_fn(move |req| dispatch(endpoint.clone(), req, remote_addr));

                        // HTTP/1.1 or HTTP/2, whatever the client speaks.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                Some(joined) = tasks.join_next(), if !tasks.is_empty() => reap(joined),
            }
        }

        while let Some(joined) = tasks.join_next().await {
            reap(joined);
        }

        info!("tollgate stopped");
        Ok(())
    }
}

fn reap(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            error!("connection task panicked: {e}");
        }
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Reads the body, converts the request and runs it through the app.
///
/// Every failure becomes an envelope, so hyper never sees an error.
async fn dispatch(
    endpoint: BoxedEndpoint,
    req: hyper::Request<Incoming>,
    remote_addr: SocketAddr,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    let Ok(method) = parts.method.as_str().parse::<Method>() else {
        return Ok(ApiError::not_found("not found").into_response().into_inner());
    };

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            let err = ApiError::bad_request(format!("unable to read request body: {e}"));
            return Ok(err.into_response().into_inner());
        }
    };

    let mut req = Request::from_parts(method, parts.uri, parts.headers, body);
    req.extensions_mut().insert(PeerAddr(remote_addr));

    Ok(endpoint.call(req).await.into_inner())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or Ctrl-C. On Windows only Ctrl-C is
/// available. A signal that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("unable to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("unable to listen for SIGTERM: {e}");
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
