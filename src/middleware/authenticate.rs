//! Bearer-token authentication.

use std::future::ready;
use std::sync::Arc;

use tracing::{debug, warn};

use super::Middleware;
use crate::auth::{AuthContext, Authenticator, TokenError};
use crate::config::AuthConfig;
use crate::error::ApiError;
use crate::handler::{BoxFuture, BoxedEndpoint, Endpoint};
use crate::request::Request;
use crate::response::IntoResponse;
use crate::router::RouteError;
use crate::table::{self, RouteTable};

pub(super) const NAME: &str = "authenticate";

const SCHEME_ERROR: &str = "authorization is not valid: schema must be bearer";

/// Requires `Authorization: Bearer <token>` on every route not in the
/// ignore-list and stores the verified [`AuthContext`] in the request
/// extensions.
///
/// Ignore-list entries are `"METHOD /pattern"` keys. A request skips
/// authentication only when the route the router resolved it to has the
/// same method and shape as an entry, so `/users/self` is not covered by an
/// ignored `/users/{id}`. Requests that match no route are authenticated like
/// any other. Every rejection is a 403 and the request goes no further.
///
/// ```rust
/// use std::sync::Arc;
/// use tollgate::middleware::Authenticate;
/// use tollgate::token::JwtAuthenticator;
///
/// let auth = Authenticate::new(Arc::new(JwtAuthenticator::new(b"secret")))
///     .ignore(["POST /auth/login", "POST /users"])
///     .unwrap();
/// ```
pub struct Authenticate {
    authenticator: Arc<dyn Authenticator>,
    ignore: Arc<RouteTable<()>>,
}

impl Authenticate {
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self { authenticator, ignore: Arc::new(RouteTable::new()) }
    }

    /// Replaces the ignore-list.
    pub fn ignore<I, K>(self, routes: I) -> Result<Self, RouteError>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let ignore = table::from_keys(routes.into_iter().map(|key| (key, ())))?;
        Ok(Self { ignore: Arc::new(ignore), ..self })
    }

    /// Uses `[auth] ignore` with the given authenticator.
    pub fn from_config(config: &AuthConfig, authenticator: Arc<dyn Authenticator>) -> Result<Self, RouteError> {
        Self::new(authenticator).ignore(&config.ignore)
    }
}

impl Middleware for Authenticate {
    fn name(&self) -> &'static str { NAME }

    fn wrap(&self, next: BoxedEndpoint) -> BoxedEndpoint {
        Arc::new(AuthenticateEndpoint {
            authenticator: Arc::clone(&self.authenticator),
            ignore: Arc::clone(&self.ignore),
            next,
        })
    }
}

struct AuthenticateEndpoint {
    authenticator: Arc<dyn Authenticator>,
    ignore: Arc<RouteTable<()>>,
    next: BoxedEndpoint,
}

impl AuthenticateEndpoint {
    fn identify(&self, req: &Request) -> Result<AuthContext, ApiError> {
        let (scheme, token) = req
            .header("authorization")
            .and_then(|h| h.trim().split_once(' '))
            .ok_or_else(|| ApiError::forbidden(SCHEME_ERROR))?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(ApiError::forbidden(SCHEME_ERROR));
        }

        let claims = self
            .authenticator
            .verify(token.trim())
            .map_err(|e| ApiError::forbidden(e.to_string()))?;
        // Custom authenticators may not check expiry themselves.
        if claims.is_expired() {
            return Err(ApiError::forbidden(TokenError::Expired.to_string()));
        }
        Ok(claims)
    }
}

impl Endpoint for AuthenticateEndpoint {
    fn call(&self, mut req: Request) -> BoxFuture {
        let ignored = req.route().is_some_and(|r| self.ignore.get(r.method(), r.pattern()).is_some());
        if ignored {
            return self.next.call(req);
        }

        match self.identify(&req) {
            Ok(claims) => {
                debug!(user_id = claims.user_id, role = %claims.role, "request authenticated");
                req.extensions_mut().insert(claims);
                self.next.call(req)
            }
            Err(err) => {
                warn!(method = %req.method(), path = req.path(), reason = err.message(), "authentication rejected");
                Box::pin(ready(err.into_response()))
            }
        }
    }
}
