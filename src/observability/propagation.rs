//! Request-scoped trace-context propagation.
//!
//! # Data Flow
//! ```text
//! trace-context middleware
//!     → scope(ctx, handler future)    installs ctx for one request
//!     → current()                     read from anywhere downstream
//!     → log formatter consumes ctx    (observability::logging)
//! ```
//!
//! # Design Decisions
//! - Task-local storage, not a global variable: concurrently handled
//!   requests each see only the context their own scope installed
//! - `current()` outside any scope returns an empty context, so log
//!   calls issued before the middleware ran (or outside any request)
//!   still format correctly

use std::future::Future;

use crate::observability::trace::TraceContext;

tokio::task_local! {
    static TRACE_CONTEXT: TraceContext;
}

/// Run `fut` with `ctx` installed as the current trace context.
///
/// The context is visible to everything the future awaits, including
/// nested calls, and is dropped when the future completes. Sibling tasks
/// are unaffected.
pub fn scope<F>(ctx: TraceContext, fut: F) -> tokio::task::futures::TaskLocalFuture<TraceContext, F>
where
    F: Future,
{
    TRACE_CONTEXT.scope(ctx, fut)
}

/// Synchronous variant of [`scope`] for non-async call sites.
pub fn sync_scope<F, R>(ctx: TraceContext, f: F) -> R
where
    F: FnOnce() -> R,
{
    TRACE_CONTEXT.sync_scope(ctx, f)
}

/// The trace context of the current request, or an empty context when no
/// request scope is active.
pub fn current() -> TraceContext {
    TRACE_CONTEXT
        .try_with(|ctx| ctx.clone())
        .unwrap_or_default()
}
