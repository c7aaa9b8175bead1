//! Request router.
//!
//! One ranked list per HTTP method, built once at startup and read-only
//! afterwards. You register a pattern, you get a handler. When patterns
//! overlap, the one with more literal segments wins, then the one declared
//! first. A path that only matches under another method is a plain 404.
//!
//! Resolution happens once, before the middleware chain runs. The winning
//! route is stored as a [`MatchedRoute`] so the ignore-list and the role map
//! judge the same declaration the handler belongs to.

use std::future::ready;
use std::sync::Arc;

use crate::error::ApiError;
use crate::handler::{BoxFuture, BoxedEndpoint, Endpoint, Handler};
use crate::method::{Method, UnknownMethod};
use crate::path::{Pattern, PatternError, Wildcards};
use crate::request::Request;
use crate::response::IntoResponse;
use crate::table::RouteTable;

/// Route configuration errors. All of them are startup-time mistakes.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum RouteError {
    #[error("method {0} cannot carry routes")]
    UnsupportedMethod(Method),

    #[error("route `{method} {pattern}` is already registered")]
    Duplicate { method: Method, pattern: String },

    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error(transparent)]
    Method(#[from] UnknownMethod),

    #[error("route key `{0}` must look like `METHOD /pattern`")]
    MalformedKey(String),
}

/// The declaration a request resolved to.
///
/// Stored in the request extensions ahead of every middleware. Absent when
/// no route matches.
#[derive(Clone, Debug)]
pub struct MatchedRoute {
    method: Method,
    pattern: Pattern,
}

impl MatchedRoute {
    pub fn new(method: Method, pattern: Pattern) -> Self {
        Self { method, pattern }
    }

    pub fn method(&self) -> Method { self.method }
    pub fn pattern(&self) -> &Pattern { &self.pattern }
}

/// The application router.
///
/// Build it once at startup and hand it to [`App::new`](crate::App::new).
/// Each [`Router::on`] call returns `self` so registrations chain naturally.
pub struct Router {
    routes: RouteTable<BoxedEndpoint>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: RouteTable::new() }
    }

    /// Register a typed handler for a method + pattern pair. Returns `self`
    /// for chaining.
    ///
    /// Wildcards use `{name}` syntax and feed the parameter set under `name`:
    ///
    /// ```rust,no_run
    /// # use tollgate::{ApiError, Context, Method, Router};
    /// # async fn get_user(_: Context, _: ()) -> Result<(), ApiError> { Ok(()) }
    /// # async fn create_user(_: Context, _: ()) -> Result<(), ApiError> { Ok(()) }
    /// # async fn list_accounts(_: Context, _: ()) -> Result<(), ApiError> { Ok(()) }
    /// Router::new()
    ///     .on(Method::Post, "/users",                    create_user)
    ///     .on(Method::Get,  "/users/{id}",               get_user)
    ///     .on(Method::Get,  "/users/{user_id}/accounts", list_accounts);
    /// ```
    ///
    /// # Panics
    ///
    /// On any [`RouteError`]: an unroutable method, a malformed pattern or a
    /// duplicate. A misconfigured route table must stop the process before it
    /// serves. Use [`try_on`](Self::try_on) to handle the error instead.
    pub fn on<Req>(self, method: Method, pattern: &str, handler: impl Handler<Req>) -> Self {
        self.try_on(method, pattern, handler)
            .unwrap_or_else(|e| panic!("invalid route `{method} {pattern}`: {e}"))
    }

    /// Fallible form of [`on`](Self::on).
    pub fn try_on<Req>(
        mut self,
        method: Method,
        pattern: &str,
        handler: impl Handler<Req>,
    ) -> Result<Self, RouteError> {
        if !method.is_routable() {
            return Err(RouteError::UnsupportedMethod(method));
        }
        let pattern = Pattern::parse(pattern)?;
        self.routes.insert(method, pattern, handler.into_endpoint())?;
        Ok(self)
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize { self.routes.len() }
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub(crate) fn lookup(&self, method: Method, path: &str) -> Option<(BoxedEndpoint, MatchedRoute, Wildcards)> {
        let (pattern, handler) = self.routes.find(method, path)?;
        let wildcards = pattern.extract(path);
        Some((Arc::clone(handler), MatchedRoute::new(method, pattern.clone()), wildcards))
    }

    /// Freezes the router into an endpoint with no middleware.
    pub fn into_endpoint(self) -> BoxedEndpoint {
        self.into_endpoint_with(|dispatch| dispatch)
    }

    /// Freezes the router, with `chain` built around the handler call.
    ///
    /// The route is resolved before `chain` runs.
    pub(crate) fn into_endpoint_with(self, chain: impl FnOnce(BoxedEndpoint) -> BoxedEndpoint) -> BoxedEndpoint {
        Arc::new(Resolve { router: self, next: chain(Arc::new(Dispatch)) })
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

/// Handler picked by [`Resolve`], waiting for [`Dispatch`].
#[derive(Clone)]
struct Target(BoxedEndpoint);

/// Looks the request up and records the route, its wildcard bindings and
/// its handler.
struct Resolve {
    router: Router,
    next: BoxedEndpoint,
}

impl Endpoint for Resolve {
    fn call(&self, mut req: Request) -> BoxFuture {
        if let Some((handler, route, wildcards)) = self.router.lookup(req.method(), req.path()) {
            let extensions = req.extensions_mut();
            extensions.insert(route);
            extensions.insert(wildcards);
            extensions.insert(Target(handler));
        }
        self.next.call(req)
    }
}

/// Calls the resolved handler.
struct Dispatch;

impl Endpoint for Dispatch {
    fn call(&self, mut req: Request) -> BoxFuture {
        match req.extensions_mut().remove::<Target>() {
            Some(Target(handler)) => handler.call(req),
            None => Box::pin(ready(ApiError::not_found("not found").into_response())),
        }
    }
}
