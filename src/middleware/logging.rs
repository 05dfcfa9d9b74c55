//! Request logging layer.

use std::sync::Arc;

use tokio::time::Instant;
use tracing::{error, info};

use crate::context::CancellationToken;
use crate::error::Result;
use crate::handler::{BoxFuture, Handler, Request};

/// Outermost layer: logs the start, completion, and failure of every dispatch with the
/// elapsed time.
///
/// Emits through `tracing`, tagged with the request's short type name:
///
/// ```text
/// INFO  handling request request="GetUserById"
/// INFO  request handled request="GetUserById" elapsed_ms=1.2
/// ERROR request failed request="GetUserById" elapsed_ms=0.8 error=user with id '…' was not found
/// ```
///
/// The result of the inner chain is returned as-is; errors are observed, never
/// swallowed or rewritten.
pub struct LoggingLayer<R: Request> {
    inner: Arc<dyn Handler<R>>,
}

impl<R: Request> LoggingLayer<R> {
    /// Wraps `inner`.
    pub fn new(inner: Arc<dyn Handler<R>>) -> Self {
        Self { inner }
    }
}

impl<R: Request> Handler<R> for LoggingLayer<R> {
    fn handle(&self, request: R, token: CancellationToken) -> BoxFuture<'static, Result<R::Response>> {
        let inner = Arc::clone(&self.inner);

        Box::pin(async move {
            let request_name = R::name();
            info!(request = request_name, "handling request");

            let start = Instant::now();
            let result = inner.handle(request, token).await;
            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

            match &result {
                Ok(_) => info!(request = request_name, elapsed_ms, "request handled"),
                Err(err) => error!(request = request_name, elapsed_ms, error = %err, "request failed"),
            }

            result
        })
    }
}
