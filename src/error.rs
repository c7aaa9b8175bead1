//! Error types.
//!
//! Two families live here:
//!
//! - [`ApiError`] is what a request can fail with. It always ends up on the
//!   wire as an [`Envelope`](crate::Envelope) carrying the matching status.
//! - [`Error`] surfaces infrastructure failures: binding a port, reading the
//!   configuration, assembling routes or the middleware pipeline.

use std::fmt;

use http::StatusCode;

use crate::config::ConfigError;
use crate::middleware::PipelineError;
use crate::router::RouteError;

/// Request-level failure categories.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Malformed body, coercion failure or a validation error raised by a handler.
    BadRequest,
    /// Authorization is required but no identity was established.
    Unauthorized,
    /// Identity established but not allowed, or the token itself is invalid.
    Forbidden,
    /// No route resolves.
    NotFound,
    /// Broken invariants and recovered panics.
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            Self::BadRequest   => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden    => StatusCode::FORBIDDEN,
            Self::NotFound     => StatusCode::NOT_FOUND,
            Self::Internal     => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BadRequest   => "bad request",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden    => "forbidden",
            Self::NotFound     => "not found",
            Self::Internal     => "internal error",
        };
        f.write_str(name)
    }
}

/// An error that is rendered to the client as an error envelope.
///
/// Handlers return `Result<T, E>` with `E: Into<ApiError>`. Plain strings
/// convert to [`ErrorKind::BadRequest`]: unless a domain error says
/// otherwise, the caller is assumed to be at fault.
///
/// ```rust
/// use tollgate::{ApiError, ErrorKind};
///
/// let err: ApiError = "name must not be empty".into();
/// assert_eq!(err.kind(), ErrorKind::BadRequest);
///
/// let err = ApiError::not_found("user does not exist");
/// assert_eq!(err.status().as_u16(), 404);
/// ```
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
    details: Vec<String>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), details: Vec::new() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Attaches one extra line to the envelope's `details` array.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.details.push(detail.into());
        self
    }

    pub fn kind(&self) -> ErrorKind { self.kind }
    pub fn message(&self) -> &str { &self.message }
    pub fn details(&self) -> &[String] { &self.details }
    pub fn status(&self) -> StatusCode { self.kind.status() }
}

impl From<String> for ApiError {
    fn from(message: String) -> Self {
        Self::bad_request(message)
    }
}

impl From<&'static str> for ApiError {
    fn from(message: &'static str) -> Self {
        Self::bad_request(message)
    }
}

/// The error type returned by tollgate's fallible setup operations.
///
/// Application-level failures (404, 403, ...) are [`ApiError`]s rendered as
/// envelopes, never `Error`s. This type covers what stops a process from
/// serving at all.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("route: {0}")]
    Route(#[from] RouteError),

    #[error("pipeline: {0}")]
    Pipeline(#[from] PipelineError),
}
