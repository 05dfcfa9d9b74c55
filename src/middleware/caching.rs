//! Read-through caching layer.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::on_cache_failure;
use crate::cache::{CacheStore, CacheValue};
use crate::config::{CacheFailurePolicy, MediatorConfig};
use crate::context::CancellationToken;
use crate::error::Result;
use crate::handler::{BoxFuture, Handler, Request};

/// Serves cacheable requests from the [`CacheStore`] and fills it on a miss.
///
/// # Behavior
///
/// - Requests without a [`CachePolicy`](crate::handler::CachePolicy), and every request
///   when caching is disabled in [`MediatorConfig`], are forwarded untouched.
/// - On a hit the stored response is cloned and returned; the wrapped handler is
///   **not** called.
/// - On a miss the wrapped handler runs and its response is stored under the policy key
///   with the policy TTL before being returned.
/// - Failures are never cached and propagate unchanged.
/// - If the dispatch was cancelled by the time the wrapped handler returns, nothing is
///   written.
/// - A stored value of a different type than `R::Response` counts as a miss and is
///   overwritten.
pub struct CachingLayer<R: Request> {
    inner: Arc<dyn Handler<R>>,
    cache: Arc<dyn CacheStore>,
    enabled: bool,
    on_failure: CacheFailurePolicy,
}

impl<R: Request> CachingLayer<R> {
    /// Wraps `inner`, caching into `cache` according to `config`.
    pub fn new(
        inner: Arc<dyn Handler<R>>,
        cache: Arc<dyn CacheStore>,
        config: &MediatorConfig,
    ) -> Self {
        Self {
            inner,
            cache,
            enabled: config.caching,
            on_failure: config.cache_failure,
        }
    }
}

impl<R: Request> Handler<R> for CachingLayer<R> {
    fn handle(&self, request: R, token: CancellationToken) -> BoxFuture<'static, Result<R::Response>> {
        let policy = match request.cache_policy() {
            Some(policy) if self.enabled => policy,
            _ => return self.inner.handle(request, token),
        };

        let inner = Arc::clone(&self.inner);
        let cache = Arc::clone(&self.cache);
        let on_failure = self.on_failure;

        Box::pin(async move {
            let request_name = R::name();

            match cache.get(&policy.key) {
                Ok(Some(value)) => match value.downcast_ref::<R::Response>() {
                    Some(response) => {
                        info!(request = request_name, cache_key = %policy.key, "cache hit");
                        return Ok(response.clone());
                    }
                    None => {
                        warn!(request = request_name, cache_key = %policy.key, "cached value has an unexpected type, treating as miss");
                    }
                },
                Ok(None) => {
                    info!(request = request_name, cache_key = %policy.key, "cache miss");
                }
                Err(err) => on_cache_failure(on_failure, request_name, &policy.key, "get", err)?,
            }

            let response = inner.handle(request, token.clone()).await?;

            if token.is_cancelled() {
                debug!(request = request_name, cache_key = %policy.key, "dispatch cancelled, skipping cache write");
                return Ok(response);
            }

            let value: CacheValue = Arc::new(response.clone());
            if let Err(err) = cache.set(&policy.key, value, policy.ttl) {
                on_cache_failure(on_failure, request_name, &policy.key, "set", err)?;
            }

            Ok(response)
        })
    }
}
