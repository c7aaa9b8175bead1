//! Outgoing HTTP response type, the JSON [`Envelope`] and the
//! [`IntoResponse`] conversion trait.
//!
//! Every response tollgate writes is one envelope:
//!
//! ```text
//! success   {"code":200,"data":{...}}
//! failure   {"code":403,"message":"authorization is not valid: role is not valid"}
//! ```

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use http_body_util::Full;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::ApiError;

// ── Envelope ─────────────────────────────────────────────────────────────────

/// The uniform JSON body of every response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T = serde_json::Value> {
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    /// `{"code":200,"data":...}`
    pub fn ok(data: T) -> Self {
        Self { code: StatusCode::OK.as_u16(), message: None, details: Vec::new(), data: Some(data) }
    }
}

impl Envelope {
    /// `{"code":200}`, for responses that carry nothing.
    pub fn empty() -> Self {
        Self { code: StatusCode::OK.as_u16(), message: None, details: Vec::new(), data: None }
    }

    pub fn from_error(err: &ApiError) -> Self {
        Self {
            code: err.status().as_u16(),
            message: Some(err.message().to_owned()),
            details: err.details().to_vec(),
            data: None,
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// Build one from an envelope or an error and let middlewares add headers
/// on the way out:
///
/// ```rust
/// use tollgate::{ApiError, Envelope, IntoResponse, Response};
///
/// let ok = Envelope::ok(serde_json::json!({"id": 1})).into_response();
/// assert_eq!(ok.status().as_u16(), 200);
///
/// let denied = ApiError::forbidden("role is not valid").into_response();
/// assert_eq!(denied.status().as_u16(), 403);
/// ```
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    /// An `application/json` response with the given status and body.
    pub fn json(status: StatusCode, body: impl Into<Bytes>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Self { status, headers, body: body.into() }
    }

    pub fn status(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Sets a header, replacing any previous value.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Parses the body back into an envelope.
    pub fn envelope<T: DeserializeOwned>(&self) -> Result<Envelope<T>, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    pub(crate) fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

// ── IntoResponse ─────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

/// Serialises the envelope. The status line follows `code`; a code that is
/// not a valid status is sent, and written, as 500.
impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(mut self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        self.code = status.as_u16();
        match serde_json::to_vec(&self) {
            Ok(body) => Response::json(status, body),
            Err(e) => {
                error!(error = %e, "failed to serialise response envelope");
                ApiError::internal("unable to encode response").into_response()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match serde_json::to_vec(&Envelope::from_error(&self)) {
            Ok(body) => Response::json(status, body),
            Err(_) => Response::json(status, Bytes::new()),
        }
    }
}

impl<T: Serialize> IntoResponse for Result<T, ApiError> {
    fn into_response(self) -> Response {
        match self {
            Ok(data) => Envelope::ok(data).into_response(),
            Err(err) => err.into_response(),
        }
    }
}
