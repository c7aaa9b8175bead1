//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns. A middleware wraps the next [`Endpoint`] and
//! returns a new one. A [`Pipeline`] applies its layers so that the first
//! one declared is the outermost: first to see the request, last to see the
//! response.
//!
//! ```text
//! Pipeline::new()
//!     .layer(Recovery::new())      ─┐ outermost, catches panics from everything below
//!     .layer(Trace::new())          │
//!     .layer(Cors::new())           │
//!     .layer(authenticate)          │ attaches AuthContext
//!     .layer(rbac)                 ─┘ reads AuthContext
//!     → router dispatch
//! ```
//!
//! Built-in middleware:
//! - [`Recovery`]: converts panics into a 500 envelope
//! - [`Trace`]: per-request span with method, path, status and latency
//! - [`Cors`]: permissive cross-origin headers, answers pre-flight requests
//! - [`Authenticate`]: bearer-token verification with an ignore-list
//! - [`Rbac`]: role checks per route
//!
//! [`Endpoint`]: crate::handler::Endpoint

mod authenticate;
mod cors;
mod rbac;
mod recovery;
mod trace;

pub use authenticate::Authenticate;
pub use cors::Cors;
pub use rbac::Rbac;
pub use recovery::Recovery;
pub use trace::Trace;

use crate::handler::BoxedEndpoint;

/// A request interceptor.
pub trait Middleware: Send + Sync + 'static {
    /// Short identifier used in logs and for ordering checks.
    fn name(&self) -> &'static str;

    /// Wraps `next`, returning the endpoint that runs this middleware first.
    fn wrap(&self, next: BoxedEndpoint) -> BoxedEndpoint;
}

/// Ordering mistakes detected when the pipeline is assembled.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error("recovery must be the outermost middleware, found at position {position}")]
    RecoveryNotOutermost { position: usize },

    #[error("rbac needs authenticate declared before it")]
    RbacWithoutAuthenticate,
}

/// An ordered middleware chain.
#[derive(Default)]
pub struct Pipeline {
    layers: Vec<Box<dyn Middleware>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware. It runs inside every layer added before it.
    pub fn layer(mut self, middleware: impl Middleware) -> Self {
        self.layers.push(Box::new(middleware));
        self
    }

    /// Layer names, outermost first.
    pub fn names(&self) -> Vec<&'static str> {
        self.layers.iter().map(|m| m.name()).collect()
    }

    /// Checks the ordering rules: recovery outermost, authenticate before rbac.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let names = self.names();
        let position = |name: &str| names.iter().position(|n| *n == name);

        if let Some(position) = position(recovery::NAME).filter(|p| *p != 0) {
            return Err(PipelineError::RecoveryNotOutermost { position });
        }
        if let Some(rbac) = position(rbac::NAME) {
            match position(authenticate::NAME) {
                Some(auth) if auth < rbac => {}
                _ => return Err(PipelineError::RbacWithoutAuthenticate),
            }
        }
        Ok(())
    }

    /// Wraps `inner` in every layer, last declared innermost.
    pub fn compose(&self, inner: BoxedEndpoint) -> BoxedEndpoint {
        self.layers.iter().rev().fold(inner, |next, layer| layer.wrap(next))
    }
}
