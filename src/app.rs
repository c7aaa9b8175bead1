//! The assembled application: router plus middleware pipeline.

use tracing::info;

use crate::error::Error;
use crate::handler::BoxedEndpoint;
use crate::middleware::Pipeline;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// A router wrapped in its middleware chain, ready to serve.
///
/// Assembly checks the pipeline ordering, so a misordered chain never
/// reaches the listener. [`App::handle`] runs one request through the whole
/// chain without a socket, which is how the integration tests drive it.
///
/// ```rust
/// use tollgate::{ApiError, App, Context, Method, Request, Router};
/// use tollgate::middleware::{Pipeline, Recovery};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let router = Router::new().on(Method::Get, "/ping", |_: Context, (): ()| async {
///     Ok::<_, ApiError>("pong")
/// });
/// let app = App::new(router, Pipeline::new().layer(Recovery::new())).unwrap();
///
/// let res = app.handle(Request::new(Method::Get, "/ping".parse().unwrap())).await;
/// assert_eq!(res.body(), br#"{"code":200,"data":"pong"}"#);
/// # }
/// ```
#[derive(Clone)]
pub struct App {
    endpoint: BoxedEndpoint,
}

impl App {
    pub fn new(router: Router, pipeline: Pipeline) -> Result<Self, Error> {
        pipeline.validate()?;
        info!(routes = router.len(), middleware = ?pipeline.names(), "application assembled");
        Ok(Self { endpoint: router.into_endpoint_with(|dispatch| pipeline.compose(dispatch)) })
    }

    /// A bare router with no middleware.
    pub fn from_router(router: Router) -> Self {
        Self { endpoint: router.into_endpoint() }
    }

    /// Runs `req` through every middleware and the router.
    pub async fn handle(&self, req: Request) -> Response {
        self.endpoint.call(req).await
    }

    pub(crate) fn endpoint(&self) -> BoxedEndpoint {
        self.endpoint.clone()
    }
}
