//! Handler traits and type erasure.
//!
//! # How typed handlers are stored
//!
//! Every route has its own request and response types, yet the router keeps
//! all of them in one table. Each handler is therefore erased behind the
//! [`Endpoint`] trait, which takes a [`Request`] and yields a [`Response`].
//! Middlewares use the same trait, so a wrapped chain is also just an
//! endpoint.
//!
//! ```text
//! async fn get_user(ctx: Context, req: GetUser) -> Result<User, ApiError>   ← user writes this
//!        ↓ router.on(Method::Get, "/users/{id}", get_user)
//! get_user.into_endpoint()                               ← Handler blanket impl
//!        ↓
//! Arc::new(TypedHandler { f: get_user, .. })             ← heap-allocated wrapper
//!        ↓  stored as BoxedEndpoint = Arc<dyn Endpoint>
//! endpoint.call(req)  at request time                    ← one vtable dispatch
//!        ↓
//! collect params → GetUser::from_params → get_user(ctx, input) → Envelope
//! ```

use std::future::{Future, ready};
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use http::{Extensions, Uri};
use serde::Serialize;

use crate::auth::AuthContext;
use crate::bind::FromParams;
use crate::error::ApiError;
use crate::method::Method;
use crate::params;
use crate::path::Wildcards;
use crate::request::Request;
use crate::response::{Envelope, IntoResponse, Response};

// ── Erased endpoint ──────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future that resolves to a [`Response`].
///
/// `Send + 'static` lets tokio move the future across worker threads.
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Anything that turns a request into a response: a routed handler, the
/// router's dispatcher, or a middleware wrapping another endpoint.
pub trait Endpoint: Send + Sync + 'static {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A type-erased endpoint shared across concurrent requests.
pub type BoxedEndpoint = Arc<dyn Endpoint>;

/// Wraps a closure as an endpoint.
///
/// ```rust
/// use tollgate::{ApiError, IntoResponse, Request};
/// use tollgate::handler::endpoint_fn;
///
/// let teapot = endpoint_fn(|_req: Request| async { ApiError::bad_request("no").into_response() });
/// ```
pub fn endpoint_fn<F, Fut>(f: F) -> BoxedEndpoint
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(FnEndpoint(f))
}

struct FnEndpoint<F>(F);

impl<F, Fut> Endpoint for FnEndpoint<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        Box::pin((self.0)(req))
    }
}

// ── Handler context ──────────────────────────────────────────────────────────

/// What a typed handler knows about the request besides its bound input.
#[derive(Debug)]
pub struct Context {
    method: Method,
    uri: Uri,
    extensions: Extensions,
}

impl Context {
    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { self.uri.path() }

    /// The caller's identity, when the route is authenticated.
    pub fn auth(&self) -> Option<&AuthContext> {
        self.extensions.get::<AuthContext>()
    }

    /// Any value a middleware stored in the request extensions.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }
}

// ── Public Handler trait ─────────────────────────────────────────────────────

/// Implemented for every valid typed route handler.
///
/// You never implement this yourself. It is satisfied by any function or
/// closure shaped like:
///
/// ```text
/// async fn name(ctx: Context, req: Req) -> Result<Res, E>
///     where Req: FromParams, Res: Serialize, E: Into<ApiError>
/// ```
///
/// Services are injected by capturing them in a closure:
///
/// ```rust
/// use std::sync::Arc;
/// use tollgate::{ApiError, Context, Method, Router};
///
/// struct Greeter { greeting: String }
///
/// let greeter = Arc::new(Greeter { greeting: "hello".into() });
/// let router = Router::new().on(Method::Get, "/greeting", move |_ctx: Context, (): ()| {
///     let greeter = Arc::clone(&greeter);
///     async move { Ok::<_, ApiError>(greeter.greeting.clone()) }
/// });
/// ```
///
/// The trait is sealed: only the blanket impl below can satisfy it.
pub trait Handler<Req>: private::Sealed<Req> + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_endpoint(self) -> BoxedEndpoint;
}

mod private {
    pub trait Sealed<Req> {}
}

impl<F, Fut, Req, Res, E> private::Sealed<Req> for F
where
    F: Fn(Context, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Res, E>> + Send + 'static,
    Req: FromParams + Send + 'static,
    Res: Serialize + Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
}

impl<F, Fut, Req, Res, E> Handler<Req> for F
where
    F: Fn(Context, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Res, E>> + Send + 'static,
    Req: FromParams + Send + 'static,
    Res: Serialize + Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    fn into_endpoint(self) -> BoxedEndpoint {
        Arc::new(TypedHandler { f: self, _req: PhantomData })
    }
}

// ── Concrete wrapper ─────────────────────────────────────────────────────────

/// Bridges a typed handler to [`Endpoint`]: collects parameters, binds the
/// request type, calls the handler and wraps the outcome in an envelope.
struct TypedHandler<F, Req> {
    f: F,
    _req: PhantomData<fn() -> Req>,
}

impl<F, Fut, Req, Res, E> Endpoint for TypedHandler<F, Req>
where
    F: Fn(Context, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Res, E>> + Send + 'static,
    Req: FromParams + Send + 'static,
    Res: Serialize + Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let (method, uri, body, extensions) = req.into_parts();

        // The dispatcher always stores the bindings before calling in.
        let Some(wildcards) = extensions.get::<Wildcards>() else {
            let err = ApiError::internal("unable to get wildcard params");
            return Box::pin(ready(err.into_response()));
        };

        let input = match params::collect(&body, wildcards, uri.query())
            .and_then(|params| Req::from_params(&params))
        {
            Ok(input) => input,
            Err(err) => return Box::pin(ready(err.into_response())),
        };

        let fut = (self.f)(Context { method, uri, extensions }, input);
        Box::pin(async move {
            match fut.await {
                Ok(data) => Envelope::ok(data).into_response(),
                Err(err) => {
                    let err: ApiError = err.into();
                    err.into_response()
                }
            }
        })
    }
}
