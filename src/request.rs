//! Incoming HTTP request type.

use std::net::SocketAddr;

use bytes::Bytes;
use http::{Extensions, HeaderMap, HeaderName, HeaderValue, Uri};

use crate::auth::AuthContext;
use crate::method::Method;
use crate::path::Wildcards;
use crate::router::MatchedRoute;

/// Remote address of the connection a request arrived on. The server stores
/// it in the request extensions.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PeerAddr(pub SocketAddr);

/// An incoming HTTP request with its body fully read.
///
/// Middlewares pass it down the chain by value. Anything a middleware learns
/// about the request, such as the caller's [`AuthContext`], goes into the
/// [`extensions`](Self::extensions_mut) and lives until the response is
/// written.
#[derive(Debug)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    extensions: Extensions,
}

impl Request {
    /// Builds a request by hand, without a socket. Useful with
    /// [`App::handle`](crate::App::handle).
    ///
    /// ```rust
    /// use tollgate::{Method, Request};
    ///
    /// let req = Request::new(Method::Post, "/users?invite=1".parse().unwrap())
    ///     .with_header("authorization", "Bearer abc")
    ///     .with_body(r#"{"name":"alice"}"#);
    /// assert_eq!(req.path(), "/users");
    /// assert_eq!(req.query(), Some("invite=1"));
    /// ```
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            extensions: Extensions::new(),
        }
    }

    pub(crate) fn from_parts(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self { method, uri, headers, body, extensions: Extensions::new() }
    }

    /// Adds a header. Invalid names or values are skipped.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (name.parse::<HeaderName>(), HeaderValue::from_str(value)) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> Method { self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn path(&self) -> &str { self.uri.path() }
    pub fn query(&self) -> Option<&str> { self.uri.query() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn extensions(&self) -> &Extensions { &self.extensions }
    pub fn extensions_mut(&mut self) -> &mut Extensions { &mut self.extensions }

    /// Case-insensitive header lookup. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter once the request has been routed.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.extensions.get::<Wildcards>()?.get(key)
    }

    /// The route this request resolved to. `None` when nothing matched.
    pub fn route(&self) -> Option<&MatchedRoute> {
        self.extensions.get::<MatchedRoute>()
    }

    /// The remote socket address, for requests that came in over a connection.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.extensions.get::<PeerAddr>().map(|p| p.0)
    }

    /// The identity established by [`Authenticate`](crate::middleware::Authenticate), if any.
    pub fn auth(&self) -> Option<&AuthContext> {
        self.extensions.get::<AuthContext>()
    }

    pub(crate) fn into_parts(self) -> (Method, Uri, Bytes, Extensions) {
        (self.method, self.uri, self.body, self.extensions)
    }
}
