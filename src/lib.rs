//! # rmediator
//!
//! A typed request mediator. Every request type is routed to exactly one handler,
//! wrapped in a fixed chain of layers:
//!
//! ```text
//! Logging → Invalidation → Caching → handler
//! ```
//!
//! Requests opt into caching with [`Request::cache_policy`] and into cache
//! invalidation with [`Request::invalidates`]; layers for capabilities a request
//! type does not have are pass-throughs.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use rmediator::{CachePolicy, CancellationToken, Mediator, MediatorConfig, MemoryCache, Registry, Request, handler_fn};
//!
//! struct GetGreeting {
//!     name: String,
//! }
//!
//! impl Request for GetGreeting {
//!     type Response = String;
//!
//!     fn cache_policy(&self) -> Option<CachePolicy> {
//!         Some(CachePolicy::new(format!("greeting-{}", self.name)).ttl(Duration::from_secs(60)))
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> rmediator::Result<()> {
//! let mut builder = Registry::builder(Arc::new(MemoryCache::new()), MediatorConfig::default());
//! builder.register::<GetGreeting>(handler_fn(|req: GetGreeting, _token| async move {
//!     Ok(format!("Hello, {}!", req.name))
//! }))?;
//!
//! let mediator = Mediator::new(builder.build());
//! let greeting = mediator
//!     .send(GetGreeting { name: "Ada".into() }, CancellationToken::never())
//!     .await?;
//! assert_eq!(greeting, "Hello, Ada!");
//! # Ok(())
//! # }
//! ```

// ── Dispatch core ─────────────────────────────────────────────────────────────
pub mod context;
pub mod error;
pub mod handler;
pub mod mediator;
pub mod middleware;

// ── Collaborators ─────────────────────────────────────────────────────────────
pub mod cache;
pub mod config;

// ── User feature ──────────────────────────────────────────────────────────────
pub mod database;
pub mod domain;
pub mod users;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use cache::{CacheStore, MemoryCache};
pub use config::{CacheFailurePolicy, MediatorConfig};
pub use context::{CancelHandle, CancellationToken};
pub use error::{Error, Result};
pub use handler::{CachePolicy, Handler, Request, handler_fn};
pub use mediator::{HandlerModule, Mediator, Registry, RegistryBuilder};
