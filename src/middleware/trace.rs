//! Per-request tracing span.

use std::sync::Arc;
use std::time::Instant;

use tracing::{Instrument, field, info, info_span};

use super::Middleware;
use crate::handler::{BoxFuture, BoxedEndpoint, Endpoint};
use crate::request::Request;

pub(super) const NAME: &str = "trace";

/// Opens a `request` span around everything below it and emits one event
/// per response with the status and latency in microseconds.
#[derive(Clone, Copy, Debug, Default)]
pub struct Trace;

impl Trace {
    pub fn new() -> Self { Self }
}

impl Middleware for Trace {
    fn name(&self) -> &'static str { NAME }

    fn wrap(&self, next: BoxedEndpoint) -> BoxedEndpoint {
        Arc::new(TraceEndpoint { next })
    }
}

struct TraceEndpoint {
    next: BoxedEndpoint,
}

impl Endpoint for TraceEndpoint {
    fn call(&self, req: Request) -> BoxFuture {
        let span = info_span!(
            "request",
            method = %req.method(),
            path = req.path(),
            peer = field::Empty,
        );
        if let Some(peer) = req.peer_addr() {
            span.record("peer", field::display(peer));
        }

        let start = Instant::now();
        let fut = span.in_scope(|| self.next.call(req));

        Box::pin(
            async move {
                let res = fut.await;
                let latency_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
                info!(status = res.status().as_u16(), latency_us, "request completed");
                res
            }
            .instrument(span),
        )
    }
}
