//! Permissive cross-origin headers.

use std::future::ready;
use std::sync::Arc;

use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    HeaderValue,
};

use super::Middleware;
use crate::config::CorsConfig;
use crate::handler::{BoxFuture, BoxedEndpoint, Endpoint};
use crate::method::Method;
use crate::request::Request;
use crate::response::{Envelope, IntoResponse, Response};
use crate::router::RouteError;

pub(super) const NAME: &str = "cors";

const DEFAULT_METHODS: &str = "OPTIONS, GET, POST, PUT, DELETE";
const ALLOW_HEADERS: &str =
    "Accept, Content-Type, Content-Length, Accept-Encoding, X-CSRF-Token, Authorization";

/// Adds `Access-Control-Allow-*` headers to every response and answers
/// `OPTIONS` pre-flight requests itself with a `{"code":200}` envelope.
///
/// Any origin is allowed. The advertised methods default to
/// `OPTIONS, GET, POST, PUT, DELETE`.
#[derive(Clone, Debug)]
pub struct Cors {
    allow_methods: HeaderValue,
}

impl Cors {
    pub fn new() -> Self {
        Self { allow_methods: HeaderValue::from_static(DEFAULT_METHODS) }
    }

    /// Overrides the advertised methods.
    pub fn allow_methods(methods: impl IntoIterator<Item = Method>) -> Self {
        let joined = methods.into_iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
        let allow_methods = HeaderValue::from_str(&joined)
            .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_METHODS));
        Self { allow_methods }
    }

    /// Uses `[cors] allow_methods`, or the defaults when the list is empty.
    pub fn from_config(config: &CorsConfig) -> Result<Self, RouteError> {
        if config.allow_methods.is_empty() {
            return Ok(Self::new());
        }
        let methods = config
            .allow_methods
            .iter()
            .map(|m| m.parse::<Method>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::allow_methods(methods))
    }
}

impl Default for Cors {
    fn default() -> Self { Self::new() }
}

impl Middleware for Cors {
    fn name(&self) -> &'static str { NAME }

    fn wrap(&self, next: BoxedEndpoint) -> BoxedEndpoint {
        Arc::new(CorsEndpoint { allow_methods: self.allow_methods.clone(), next })
    }
}

struct CorsEndpoint {
    allow_methods: HeaderValue,
    next: BoxedEndpoint,
}

impl Endpoint for CorsEndpoint {
    fn call(&self, req: Request) -> BoxFuture {
        let allow_methods = self.allow_methods.clone();

        if req.method() == Method::Options {
            let mut res = Envelope::empty().into_response();
            decorate(&mut res, allow_methods);
            return Box::pin(ready(res));
        }

        let fut = self.next.call(req);
        Box::pin(async move {
            let mut res = fut.await;
            decorate(&mut res, allow_methods);
            res
        })
    }
}

fn decorate(res: &mut Response, allow_methods: HeaderValue) {
    res.set_header(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    res.set_header(ACCESS_CONTROL_ALLOW_METHODS, allow_methods);
    res.set_header(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS));
}
