//! Role-based access control.

use std::collections::BTreeMap;
use std::future::ready;
use std::sync::Arc;

use super::Middleware;
use crate::error::ApiError;
use crate::handler::{BoxFuture, BoxedEndpoint, Endpoint};
use crate::request::Request;
use crate::response::IntoResponse;
use crate::router::RouteError;
use crate::table::{self, RouteTable};

pub(super) const NAME: &str = "rbac";

/// Restricts routes to a set of roles.
///
/// The role map is keyed by `"METHOD /pattern"`. An entry applies to the
/// route the router resolved when method and shape agree: roles listed for
/// `/users/{id}` say nothing about a `/users/self` route. Routes that are not
/// listed, or listed with no roles, are open to anyone. For restricted routes the caller's [`AuthContext`] must be
/// present (401 otherwise) and its role must be listed (403 otherwise).
///
/// Must run after [`Authenticate`](super::Authenticate).
///
/// ```rust
/// use tollgate::middleware::Rbac;
///
/// let rbac = Rbac::new([
///     ("GET /users/{id}",    vec!["SUPER_ADMIN", "ADMIN", "USER"]),
///     ("GET /accounts/{id}", vec!["SUPER_ADMIN", "ADMIN"]),
/// ])
/// .unwrap();
/// ```
///
/// [`AuthContext`]: crate::AuthContext
pub struct Rbac {
    roles: Arc<RouteTable<Vec<String>>>,
}

impl Rbac {
    pub fn new<I, K, R, S>(map: I) -> Result<Self, RouteError>
    where
        I: IntoIterator<Item = (K, R)>,
        K: AsRef<str>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let roles = table::from_keys(
            map.into_iter()
                .map(|(key, roles)| (key, roles.into_iter().map(Into::into).collect())),
        )?;
        Ok(Self { roles: Arc::new(roles) })
    }

    /// Uses the `[rbac]` table.
    pub fn from_config(map: &BTreeMap<String, Vec<String>>) -> Result<Self, RouteError> {
        Self::new(map.iter().map(|(key, roles)| (key, roles.iter().cloned())))
    }
}

impl Middleware for Rbac {
    fn name(&self) -> &'static str { NAME }

    fn wrap(&self, next: BoxedEndpoint) -> BoxedEndpoint {
        Arc::new(RbacEndpoint { roles: Arc::clone(&self.roles), next })
    }
}

struct RbacEndpoint {
    roles: Arc<RouteTable<Vec<String>>>,
    next: BoxedEndpoint,
}

impl RbacEndpoint {
    fn check(&self, req: &Request) -> Result<(), ApiError> {
        let Some(allowed) = req.route().and_then(|r| self.roles.get(r.method(), r.pattern())) else {
            return Ok(());
        };
        if allowed.is_empty() {
            return Ok(());
        }
        let auth = req
            .auth()
            .ok_or_else(|| ApiError::unauthorized("authorization is not valid: user info not valid"))?;
        if !allowed.contains(&auth.role) {
            return Err(ApiError::forbidden("authorization is not valid: role is not valid"));
        }
        Ok(())
    }
}

impl Endpoint for RbacEndpoint {
    fn call(&self, req: Request) -> BoxFuture {
        match self.check(&req) {
            Ok(()) => self.next.call(req),
            Err(err) => Box::pin(ready(err.into_response())),
        }
    }
}
