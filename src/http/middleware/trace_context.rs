//! Trace-context extraction middleware.
//!
//! Reads `Traceparent` (preferred) and `X-Cloud-Trace-Context` (legacy
//! fallback) off every inbound request and installs the parsed context
//! for the duration of the request's handler chain. Malformed headers
//! degrade to an empty context; this middleware never fails a request.

use std::task::{Context, Poll};

use axum::http::{HeaderMap, Request};
use tokio::task::futures::TaskLocalFuture;
use tower::{Layer, Service};

use crate::observability::propagation;
use crate::observability::trace::{parse_cloud_trace_context, parse_traceparent, TraceContext};

pub const TRACEPARENT: &str = "traceparent";
pub const X_CLOUD_TRACE_CONTEXT: &str = "x-cloud-trace-context";

/// Tower layer installing the request's trace context.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceContextLayer;

impl<S> Layer<S> for TraceContextLayer {
    type Service = TraceContextService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TraceContextService { inner }
    }
}

#[derive(Debug, Clone)]
pub struct TraceContextService<S> {
    inner: S,
}

impl<S, B> Service<Request<B>> for TraceContextService<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = TaskLocalFuture<TraceContext, S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let ctx = extract_context(req.headers());
        propagation::scope(ctx, self.inner.call(req))
    }
}

/// Parse trace headers in preference order.
///
/// The legacy header is only consulted when the W3C header yielded no
/// trace id, and then replaces the whole context.
pub fn extract_context(headers: &HeaderMap) -> TraceContext {
    let ctx = headers
        .get(TRACEPARENT)
        .and_then(|value| value.to_str().ok())
        .map(parse_traceparent)
        .unwrap_or_default();
    if ctx.trace_id.is_some() {
        return ctx;
    }

    headers
        .get(X_CLOUD_TRACE_CONTEXT)
        .and_then(|value| value.to_str().ok())
        .map(parse_cloud_trace_context)
        .unwrap_or_default()
}
