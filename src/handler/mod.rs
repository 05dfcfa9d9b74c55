//! Request and handler contracts.
//!
//! A [`Request`] is an immutable value whose Rust type is its routing key. Each
//! request type declares the type of response it produces and, optionally, two
//! orthogonal capabilities:
//!
//! - **Cacheable**: [`Request::cache_policy`] returns a [`CachePolicy`] carrying a
//!   deterministic cache key and an optional time-to-live.
//! - **Invalidating**: [`Request::invalidates`] returns the cache keys to remove
//!   after the request has been handled successfully.
//!
//! Both capabilities are plain trait methods with defaults, so they are resolved per
//! request type at compile time.
//!
//! A [`Handler`] processes exactly one request type. Closures can be turned into
//! handlers with [`handler_fn`].

use std::any::type_name;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::context::CancellationToken;
use crate::error::Result;

/// Boxed, `Send` future returned by every handler and layer.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// How a cacheable request's response is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    /// Cache key derived from the request's identifying fields.
    pub key: String,
    /// Time-to-live of the cached response; `None` keeps it until invalidated.
    pub ttl: Option<Duration>,
}

impl CachePolicy {
    /// A policy that caches under `key` until explicitly invalidated.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ttl: None,
        }
    }

    /// Sets the time-to-live of the cached response.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// A value dispatched through the mediator.
///
/// # Contract
///
/// - `cache_policy` must be a deterministic function of the request's fields: two
///   equal requests must produce the same key.
/// - `invalidates` returning an empty list means the request is not invalidating.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use rmediator::handler::{CachePolicy, Request};
///
/// struct GetPrice {
///     sku: String,
/// }
///
/// impl Request for GetPrice {
///     type Response = u64;
///
///     fn cache_policy(&self) -> Option<CachePolicy> {
///         Some(CachePolicy::new(format!("price-{}", self.sku)).ttl(Duration::from_secs(60)))
///     }
/// }
///
/// assert_eq!(GetPrice::name(), "GetPrice");
/// ```
pub trait Request: Send + Sync + 'static {
    /// The value a successful dispatch returns. Cached responses are cloned out of the
    /// cache store verbatim.
    type Response: Clone + Send + Sync + 'static;

    /// Short type name used in log records and routing errors.
    fn name() -> &'static str
    where
        Self: Sized,
    {
        short_type_name::<Self>()
    }

    /// Returns `Some` when responses to this request may be cached.
    fn cache_policy(&self) -> Option<CachePolicy> {
        None
    }

    /// Cache keys to remove once this request has been handled successfully.
    fn invalidates(&self) -> Vec<String> {
        Vec::new()
    }
}

// Strips the module path (`crate::users::GetUserById` → `GetUserById`). Generic
// types keep their full path so that `Page<A>` and `Page<B>` stay distinguishable.
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = type_name::<T>();
    if full.contains('<') {
        return full;
    }
    full.rsplit("::").next().unwrap_or(full)
}

/// Processes one request type.
///
/// Concrete handlers and every layer wrapping them implement this same trait, which is
/// what lets layers be stacked without the handler or the caller knowing.
///
/// The returned future must be `'static`: implementations clone whatever shared state
/// they need (usually an [`Arc`](std::sync::Arc)) into the future.
pub trait Handler<R: Request>: Send + Sync + 'static {
    /// Handle `request`, observing `token` for cancellation.
    fn handle(&self, request: R, token: CancellationToken) -> BoxFuture<'static, Result<R::Response>>;
}

impl<R, H> Handler<R> for Arc<H>
where
    R: Request,
    H: Handler<R> + ?Sized,
{
    fn handle(&self, request: R, token: CancellationToken) -> BoxFuture<'static, Result<R::Response>> {
        (**self).handle(request, token)
    }
}

/// A [`Handler`] backed by an async closure. Created with [`handler_fn`].
pub struct HandlerFn<F, R> {
    f: F,
    _request: PhantomData<fn(R)>,
}

impl<F, R> fmt::Debug for HandlerFn<F, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerFn")
            .field("request", &type_name::<R>())
            .finish()
    }
}

/// Wraps an async closure as a [`Handler`].
///
/// # Examples
///
/// ```rust
/// use rmediator::handler::{handler_fn, Request};
///
/// struct Ping;
///
/// impl Request for Ping {
///     type Response = &'static str;
/// }
///
/// let _pong = handler_fn(|_req: Ping, _token| async { Ok("pong") });
/// ```
pub fn handler_fn<R, F, Fut>(f: F) -> HandlerFn<F, R>
where
    R: Request,
    F: Fn(R, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R::Response>> + Send + 'static,
{
    HandlerFn {
        f,
        _request: PhantomData,
    }
}

impl<R, F, Fut> Handler<R> for HandlerFn<F, R>
where
    R: Request,
    F: Fn(R, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R::Response>> + Send + 'static,
{
    fn handle(&self, request: R, token: CancellationToken) -> BoxFuture<'static, Result<R::Response>> {
        Box::pin((self.f)(request, token))
    }
}
