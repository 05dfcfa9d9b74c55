//! Handler layers: cross-cutting behavior wrapped around every concrete handler.
//!
//! Each layer implements [`Handler<R>`](crate::handler::Handler) for the same request
//! type as the handler it wraps, so layers stack without the concrete handler or the
//! caller knowing they exist.
//!
//! ## Core types
//!
//! - [`LoggingLayer`]: start/finish/failure records with elapsed time.
//! - [`InvalidationLayer`]: removes cache keys after a successful invalidating request.
//! - [`CachingLayer`]: read-through cache for cacheable requests.
//! - [`compose`]: builds the fixed chain around a concrete handler.
//!
//! ## Chain order
//!
//! Every registered request type gets exactly this chain, outermost first:
//!
//! ```text
//! LoggingLayer → InvalidationLayer → CachingLayer → concrete handler
//! ```
//!
//! Results flow back in the opposite direction. Logging therefore times cache hits as
//! well as misses, and invalidation runs after the caching layer has stored whatever
//! the handler returned.

use std::sync::Arc;

use tracing::warn;

use crate::cache::{CacheError, CacheStore};
use crate::config::{CacheFailurePolicy, MediatorConfig};
use crate::error::{Error, Result};
use crate::handler::{Handler, Request};

mod caching;
mod invalidation;
mod logging;

#[cfg(test)]
pub(crate) mod test_support;

pub use caching::CachingLayer;
pub use invalidation::InvalidationLayer;
pub use logging::LoggingLayer;

/// Wraps `concrete` in the fixed layer chain.
///
/// This is the only place the chain order is decided:
/// `Logging(Invalidation(Caching(concrete)))`. The registry calls it once per request
/// type at startup.
///
/// # Arguments
///
/// - `concrete`: the handler containing the business logic.
/// - `cache`: store shared by the caching and invalidation layers.
/// - `config`: pipeline settings copied into the layers.
///
/// # Returns
///
/// The outermost layer, ready to be registered for dispatch.
pub fn compose<R: Request>(
    concrete: Arc<dyn Handler<R>>,
    cache: Arc<dyn CacheStore>,
    config: &MediatorConfig,
) -> Arc<dyn Handler<R>> {
    let caching = CachingLayer::new(concrete, Arc::clone(&cache), config);
    let invalidation = InvalidationLayer::new(Arc::new(caching), cache, config);
    Arc::new(LoggingLayer::new(Arc::new(invalidation)))
}

// Applies the configured failure policy to a cache store error.
fn on_cache_failure(
    policy: CacheFailurePolicy,
    request: &'static str,
    key: &str,
    operation: &'static str,
    err: CacheError,
) -> Result<()> {
    match policy {
        CacheFailurePolicy::PassThrough => {
            warn!(request, cache_key = %key, operation, error = %err, "cache store failure, continuing without cache");
            Ok(())
        }
        CacheFailurePolicy::Abort => Err(Error::Cache(err)),
    }
}
