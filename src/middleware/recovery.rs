//! Panic recovery.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::FutureExt;
use tracing::error;

use super::Middleware;
use crate::error::ApiError;
use crate::handler::{BoxFuture, BoxedEndpoint, Endpoint};
use crate::request::Request;
use crate::response::IntoResponse;

pub(super) const NAME: &str = "recovery";

/// Turns a panic anywhere below it into a 500 envelope.
///
/// Both the synchronous part of the inner chain and the future it returns
/// are guarded. The panic message is logged, never sent to the client.
/// Declare it first so it guards every other middleware.
#[derive(Clone, Copy, Debug, Default)]
pub struct Recovery;

impl Recovery {
    pub fn new() -> Self { Self }
}

impl Middleware for Recovery {
    fn name(&self) -> &'static str { NAME }

    fn wrap(&self, next: BoxedEndpoint) -> BoxedEndpoint {
        Arc::new(RecoveryEndpoint { next })
    }
}

struct RecoveryEndpoint {
    next: BoxedEndpoint,
}

impl Endpoint for RecoveryEndpoint {
    fn call(&self, req: Request) -> BoxFuture {
        let method = req.method();
        let path = req.path().to_owned();
        let next = Arc::clone(&self.next);

        Box::pin(async move {
            let outcome = match panic::catch_unwind(AssertUnwindSafe(|| next.call(req))) {
                Ok(fut) => AssertUnwindSafe(fut).catch_unwind().await,
                Err(payload) => Err(payload),
            };
            match outcome {
                Ok(res) => res,
                Err(payload) => {
                    error!(%method, %path, panic = panic_message(&*payload), "request handler panicked");
                    ApiError::internal("there was an internal server error").into_response()
                }
            }
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
