//! Cache invalidation layer.

use std::sync::Arc;

use tracing::info;

use super::on_cache_failure;
use crate::cache::CacheStore;
use crate::config::{CacheFailurePolicy, MediatorConfig};
use crate::context::CancellationToken;
use crate::error::Result;
use crate::handler::{BoxFuture, Handler, Request};

/// Removes the keys listed by [`Request::invalidates`] after the wrapped handler
/// succeeds.
///
/// # Behavior
///
/// - The wrapped handler always runs first.
/// - On success every listed key is removed. Removals are independent and idempotent.
/// - On failure nothing is removed and the error propagates unchanged.
/// - Requests with no keys to invalidate are forwarded untouched.
///
/// Removal happens even when the dispatch was cancelled after the handler returned:
/// the mutation has already been committed, so the cached reads it affects must go.
///
/// With [`CacheFailurePolicy::Abort`] the first failing removal fails the dispatch and
/// the remaining keys are left in place; the mutation itself is not rolled back.
pub struct InvalidationLayer<R: Request> {
    inner: Arc<dyn Handler<R>>,
    cache: Arc<dyn CacheStore>,
    on_failure: CacheFailurePolicy,
}

impl<R: Request> InvalidationLayer<R> {
    /// Wraps `inner`, invalidating entries of `cache`.
    pub fn new(
        inner: Arc<dyn Handler<R>>,
        cache: Arc<dyn CacheStore>,
        config: &MediatorConfig,
    ) -> Self {
        Self {
            inner,
            cache,
            on_failure: config.cache_failure,
        }
    }
}

impl<R: Request> Handler<R> for InvalidationLayer<R> {
    fn handle(&self, request: R, token: CancellationToken) -> BoxFuture<'static, Result<R::Response>> {
        let keys = request.invalidates();
        if keys.is_empty() {
            return self.inner.handle(request, token);
        }

        let inner = Arc::clone(&self.inner);
        let cache = Arc::clone(&self.cache);
        let on_failure = self.on_failure;

        Box::pin(async move {
            let request_name = R::name();
            let response = inner.handle(request, token).await?;

            // No await between here and the return: once the handler has succeeded the
            // removals cannot be interrupted by dropping the dispatch.
            for key in &keys {
                match cache.remove(key) {
                    Ok(()) => info!(request = request_name, cache_key = %key, "cache entry invalidated"),
                    Err(err) => on_cache_failure(on_failure, request_name, key, "remove", err)?,
                }
            }

            Ok(response)
        })
    }
}
