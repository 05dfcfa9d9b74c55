//! Handler registry: binds each request type to its composed chain.
//!
//! Registration is explicit and statically typed: [`RegistryBuilder::register`] takes
//! the request type as a type parameter and a handler implementing
//! [`Handler`] for exactly that type. The registry is keyed by the request's
//! [`TypeId`], the same technique a type-keyed extension map uses, so a lookup can only
//! ever yield the chain that was registered for that type.
//!
//! The builder wraps every handler with [`compose`] as it is registered. The finished
//! [`Registry`] only stores composed chains; the concrete handlers and intermediate
//! layers are unreachable from outside.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::CacheStore;
use crate::config::MediatorConfig;
use crate::error::{Error, Result};
use crate::handler::{Handler, Request};
use crate::middleware::compose;

/// A group of handlers registered together, typically one feature's commands and
/// queries sharing the same collaborators.
///
/// # Examples
///
/// ```rust,ignore
/// struct Billing {
///     ledger: Arc<dyn Ledger>,
/// }
///
/// impl HandlerModule for Billing {
///     fn register(self, registry: &mut RegistryBuilder) -> Result<()> {
///         registry
///             .register::<Charge>(ChargeHandler::new(Arc::clone(&self.ledger)))?
///             .register::<GetBalance>(GetBalanceHandler::new(self.ledger))?;
///         Ok(())
///     }
/// }
/// ```
pub trait HandlerModule {
    /// Registers every handler of this module.
    fn register(self, registry: &mut RegistryBuilder) -> Result<()>;
}

// A composed chain with its request type erased.
struct Registration {
    request_type: &'static str,
    // Fully qualified, for telling apart types that share a short name.
    type_path: &'static str,
    // Always an `Arc<dyn Handler<R>>` for the `R` whose `TypeId` keys this entry.
    chain: Box<dyn Any + Send + Sync>,
}

/// Collects handler registrations at startup.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use rmediator::{MediatorConfig, MemoryCache, Registry, Request, handler_fn};
///
/// struct Ping;
///
/// impl Request for Ping {
///     type Response = &'static str;
/// }
///
/// let mut builder = Registry::builder(Arc::new(MemoryCache::new()), MediatorConfig::default());
/// builder
///     .register::<Ping>(handler_fn(|_req: Ping, _token| async { Ok("pong") }))
///     .unwrap();
///
/// let registry = builder.build();
/// assert!(registry.contains::<Ping>());
/// ```
pub struct RegistryBuilder {
    cache: Arc<dyn CacheStore>,
    config: MediatorConfig,
    registrations: HashMap<TypeId, Registration>,
}

impl fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("config", &self.config)
            .field("registrations", &self.registrations.len())
            .finish()
    }
}

impl RegistryBuilder {
    /// Creates an empty builder whose chains share `cache` and `config`.
    pub fn new(cache: Arc<dyn CacheStore>, config: MediatorConfig) -> Self {
        Self {
            cache,
            config,
            registrations: HashMap::new(),
        }
    }

    /// Composes the fixed layer chain around `handler` and registers it for `R`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateHandler`] if a handler is already registered for `R`.
    /// The existing registration is kept.
    pub fn register<R: Request>(&mut self, handler: impl Handler<R>) -> Result<&mut Self> {
        let type_id = TypeId::of::<R>();
        let request_type = R::name();
        let type_path = type_name::<R>();

        if self.registrations.contains_key(&type_id) {
            return Err(Error::DuplicateHandler { request_type });
        }

        let chain: Arc<dyn Handler<R>> =
            compose(Arc::new(handler), Arc::clone(&self.cache), &self.config);
        self.registrations.insert(
            type_id,
            Registration {
                request_type,
                type_path,
                chain: Box::new(chain),
            },
        );

        debug!(request = request_type, type_path, "registered handler chain");
        Ok(self)
    }

    /// Registers every handler of `module`.
    ///
    /// # Errors
    ///
    /// Propagates the first registration error raised by the module.
    pub fn install(&mut self, module: impl HandlerModule) -> Result<&mut Self> {
        module.register(self)?;
        Ok(self)
    }

    /// Number of request types registered so far.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Returns `true` if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Freezes the registrations into an immutable [`Registry`].
    pub fn build(self) -> Registry {
        Registry {
            chains: self.registrations,
            default_timeout: self.config.default_timeout(),
        }
    }
}

/// Immutable map from request type to composed handler chain.
///
/// Built once by [`RegistryBuilder::build`]; read concurrently without locking.
pub struct Registry {
    chains: HashMap<TypeId, Registration>,
    default_timeout: Option<Duration>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("request_types", &self.type_paths())
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}

impl Registry {
    /// Shorthand for [`RegistryBuilder::new`].
    pub fn builder(cache: Arc<dyn CacheStore>, config: MediatorConfig) -> RegistryBuilder {
        RegistryBuilder::new(cache, config)
    }

    /// Returns the composed chain registered for `R`.
    pub fn resolve<R: Request>(&self) -> Option<Arc<dyn Handler<R>>> {
        self.chains
            .get(&TypeId::of::<R>())?
            .chain
            .downcast_ref::<Arc<dyn Handler<R>>>()
            .cloned()
    }

    /// Returns `true` if a chain is registered for `R`.
    pub fn contains<R: Request>(&self) -> bool {
        self.chains.contains_key(&TypeId::of::<R>())
    }

    /// Number of registered request types.
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Returns `true` if no request type is registered.
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Names of the registered request types, sorted.
    pub fn request_types(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.chains.values().map(|r| r.request_type).collect();
        names.sort_unstable();
        names
    }

    /// Fully qualified names of the registered request types, sorted.
    ///
    /// Unlike [`request_types`](Self::request_types), these tell apart types that share
    /// a short name in different modules.
    pub fn type_paths(&self) -> Vec<&'static str> {
        let mut paths: Vec<_> = self.chains.values().map(|r| r.type_path).collect();
        paths.sort_unstable();
        paths
    }

    /// Deadline applied to dispatches whose token has none.
    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::context::CancellationToken;
    use crate::middleware::test_support::{CountingHandler, Lookup, Mutate, Plain};

    fn builder() -> RegistryBuilder {
        Registry::builder(Arc::new(MemoryCache::new()), MediatorConfig::default())
    }

    struct LookupModule;

    impl HandlerModule for LookupModule {
        fn register(self, registry: &mut RegistryBuilder) -> Result<()> {
            registry
                .register::<Lookup>(CountingHandler::<Lookup>::ok(|req| req.0))?
                .register::<Mutate>(CountingHandler::<Mutate>::ok(|_| true))?;
            Ok(())
        }
    }

    // ── registration ─────────────────────────────────────────────────────────

    #[test]
    fn builder_starts_empty() {
        let builder = builder();
        assert!(builder.is_empty());
        assert!(builder.build().is_empty());
    }

    #[test]
    fn register_adds_request_type() {
        let mut builder = builder();
        builder
            .register::<Plain>(CountingHandler::<Plain>::ok(|_| 0))
            .unwrap();
        assert_eq!(builder.len(), 1);

        let registry = builder.build();
        assert!(registry.contains::<Plain>());
        assert!(!registry.contains::<Lookup>());
        assert_eq!(registry.request_types(), vec!["Plain"]);
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut builder = builder();
        builder
            .register::<Plain>(CountingHandler::<Plain>::ok(|_| 1))
            .unwrap();

        let err = builder
            .register::<Plain>(CountingHandler::<Plain>::ok(|_| 2))
            .unwrap_err();

        assert!(matches!(err, Error::DuplicateHandler { request_type: "Plain" }));
        assert_eq!(builder.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_registration_keeps_first_handler() {
        let mut builder = builder();
        builder
            .register::<Plain>(CountingHandler::<Plain>::ok(|_| 1))
            .unwrap();
        let _ = builder.register::<Plain>(CountingHandler::<Plain>::ok(|_| 2));

        let chain = builder.build().resolve::<Plain>().unwrap();
        let out = chain.handle(Plain, CancellationToken::never()).await.unwrap();
        assert_eq!(out, 1);
    }

    #[test]
    fn install_registers_module_handlers() {
        let mut builder = builder();
        builder.install(LookupModule).unwrap();

        let registry = builder.build();
        assert_eq!(registry.request_types(), vec!["Lookup", "Mutate"]);
    }

    #[test]
    fn installing_module_twice_fails() {
        let mut builder = builder();
        builder.install(LookupModule).unwrap();
        let err = builder.install(LookupModule).unwrap_err();
        assert!(matches!(err, Error::DuplicateHandler { request_type: "Lookup" }));
    }

    mod billing {
        use crate::handler::Request;

        pub(super) struct Lookup;

        impl Request for Lookup {
            type Response = u32;
        }
    }

    #[test]
    fn type_paths_tell_same_named_types_apart() {
        let mut builder = builder();
        builder
            .register::<Lookup>(CountingHandler::<Lookup>::ok(|req| req.0))
            .unwrap()
            .register::<billing::Lookup>(CountingHandler::<billing::Lookup>::ok(|_| 0))
            .unwrap();

        let registry = builder.build();
        assert_eq!(registry.request_types(), vec!["Lookup", "Lookup"]);

        let paths = registry.type_paths();
        assert_eq!(paths.len(), 2);
        assert_ne!(paths[0], paths[1]);
        assert!(paths.iter().any(|p| p.ends_with("billing::Lookup")));
        assert!(paths.iter().any(|p| p.ends_with("test_support::Lookup")));
    }

    // ── resolution ───────────────────────────────────────────────────────────

    #[test]
    fn resolve_unknown_type_is_none() {
        assert!(builder().build().resolve::<Lookup>().is_none());
    }

    #[tokio::test]
    async fn resolved_chain_is_composed() {
        let concrete = CountingHandler::<Lookup>::ok(|req| req.0 + 1);
        let mut builder = builder();
        builder.register::<Lookup>(concrete.clone()).unwrap();

        let chain = builder.build().resolve::<Lookup>().unwrap();
        chain.handle(Lookup(1), CancellationToken::never()).await.unwrap();
        let out = chain.handle(Lookup(1), CancellationToken::never()).await.unwrap();

        // The second call is served by the caching layer.
        assert_eq!(out, 2);
        assert_eq!(concrete.calls(), 1);
    }

    #[test]
    fn registration_order_does_not_matter() {
        let mut forward = builder();
        forward
            .register::<Lookup>(CountingHandler::<Lookup>::ok(|req| req.0))
            .unwrap()
            .register::<Plain>(CountingHandler::<Plain>::ok(|_| 0))
            .unwrap();

        let mut reverse = builder();
        reverse
            .register::<Plain>(CountingHandler::<Plain>::ok(|_| 0))
            .unwrap()
            .register::<Lookup>(CountingHandler::<Lookup>::ok(|req| req.0))
            .unwrap();

        assert_eq!(
            forward.build().request_types(),
            reverse.build().request_types()
        );
    }

    #[test]
    fn default_timeout_comes_from_config() {
        let config = MediatorConfig::default().with_default_timeout(Duration::from_secs(3));
        let registry = Registry::builder(Arc::new(MemoryCache::new()), config).build();
        assert_eq!(registry.default_timeout(), Some(Duration::from_secs(3)));
    }
}
