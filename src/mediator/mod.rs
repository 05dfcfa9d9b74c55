//! Request dispatch: route a request to the chain registered for its type.
//!
//! [`Mediator`] is the single entry point callers use. It holds no business state: it
//! looks up the composed chain for the request's type in an immutable [`Registry`]
//! and forwards the request, racing the chain against the dispatch's
//! [`CancellationToken`].
//!
//! ```text
//! caller ──send──▶ Mediator ──resolve──▶ Logging → Invalidation → Caching → handler
//!        ◀─────────────────── result ─────────────────────────────────────┘
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::context::CancellationToken;
use crate::error::{Error, Result};
use crate::handler::{Handler, Request};

mod registry;

pub use registry::{HandlerModule, Registry, RegistryBuilder};

/// Dispatches requests to their registered handler chains.
///
/// `Mediator` is cheap to clone and can be shared across tasks; concurrent calls to
/// [`send`](Self::send) need no coordination.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use rmediator::{CancellationToken, Mediator, MediatorConfig, MemoryCache, Registry, Request, handler_fn};
///
/// struct Add(u32, u32);
///
/// impl Request for Add {
///     type Response = u32;
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> rmediator::Result<()> {
/// let mut builder = Registry::builder(Arc::new(MemoryCache::new()), MediatorConfig::default());
/// builder.register::<Add>(handler_fn(|req: Add, _token| async move { Ok(req.0 + req.1) }))?;
///
/// let mediator = Mediator::new(builder.build());
/// let sum = mediator.send(Add(2, 3), CancellationToken::never()).await?;
/// assert_eq!(sum, 5);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Mediator {
    registry: Arc<Registry>,
}

impl fmt::Debug for Mediator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mediator")
            .field("registry", &self.registry)
            .finish()
    }
}

impl Mediator {
    /// Creates a mediator over a finished registry.
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// The registry this mediator dispatches through.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Dispatches `request` to the chain registered for its type.
    ///
    /// # Arguments
    ///
    /// - `request`: the request value; its type selects the chain.
    /// - `token`: cancellation and deadline signal passed down to every layer. If it has
    ///   no deadline, the registry's default timeout (if configured) is attached.
    ///
    /// # Returns
    ///
    /// Whatever the chain returns, unchanged.
    ///
    /// # Errors
    ///
    /// - [`Error::Unregistered`] if no handler was registered for the request type.
    /// - [`Error::Cancelled`] / [`Error::TimedOut`] if the token fires before the chain
    ///   completes. The chain is dropped at that point and performs no further work.
    /// - Any error raised inside the chain, propagated as-is.
    pub async fn send<R: Request>(&self, request: R, token: CancellationToken) -> Result<R::Response> {
        let request_type = R::name();
        let chain = self
            .registry
            .resolve::<R>()
            .ok_or(Error::Unregistered { request_type })?;

        let token = match self.registry.default_timeout() {
            Some(timeout) if token.deadline().is_none() => token.with_timeout(timeout),
            _ => token,
        };

        if let Err(err) = token.check(request_type) {
            debug!(request = request_type, "dispatch cancelled before start");
            return Err(err);
        }

        debug!(request = request_type, "dispatching request");

        tokio::select! {
            biased;
            result = chain.handle(request, token.clone()) => result,
            () = token.cancelled() => {
                debug!(request = request_type, "dispatch cancelled in flight");
                token.check(request_type)?;
                Err(Error::Cancelled { request_type })
            }
        }
    }
}
