//! Fixtures shared by the layer and registry tests.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing_subscriber::fmt::MakeWriter;

use crate::cache::{CacheError, CacheStore, CacheValue};
use crate::context::CancellationToken;
use crate::error::{Error, Result};
use crate::handler::{BoxFuture, CachePolicy, Handler, Request};

/// Cacheable query keyed by its id.
pub(crate) struct Lookup(pub u32);

impl Request for Lookup {
    type Response = u32;

    fn cache_policy(&self) -> Option<CachePolicy> {
        Some(CachePolicy::new(format!("lookup-{}", self.0)).ttl(Duration::from_secs(300)))
    }
}

/// Command invalidating the matching [`Lookup`] key.
pub(crate) struct Mutate(pub u32);

impl Request for Mutate {
    type Response = bool;

    fn invalidates(&self) -> Vec<String> {
        vec![format!("lookup-{}", self.0), "lookup-all".to_owned()]
    }
}

/// Caches and invalidates the same key.
pub(crate) struct BothRequest(pub u32);

impl Request for BothRequest {
    type Response = u32;

    fn cache_policy(&self) -> Option<CachePolicy> {
        Some(CachePolicy::new(format!("both-{}", self.0)))
    }

    fn invalidates(&self) -> Vec<String> {
        vec![format!("both-{}", self.0)]
    }
}

/// Neither cacheable nor invalidating.
pub(crate) struct Plain;

impl Request for Plain {
    type Response = u32;
}

type Respond<R> = Box<dyn Fn(&R) -> Result<<R as Request>::Response> + Send + Sync>;

/// Handler that counts invocations and answers from a closure.
pub(crate) struct CountingHandler<R: Request> {
    calls: AtomicUsize,
    respond: Respond<R>,
    delay: Option<Duration>,
}

impl<R: Request> CountingHandler<R> {
    pub(crate) fn ok(f: impl Fn(&R) -> R::Response + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            respond: Box::new(move |req| Ok(f(req))),
            delay: None,
        })
    }

    pub(crate) fn failing(f: impl Fn(&R) -> Error + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            respond: Box::new(move |req| Err(f(req))),
            delay: None,
        })
    }

    pub(crate) fn slow(
        delay: Duration,
        f: impl Fn(&R) -> R::Response + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            respond: Box::new(move |req| Ok(f(req))),
            delay: Some(delay),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn into_handler(self: Arc<Self>) -> Arc<dyn Handler<R>> {
        self
    }
}

impl<R: Request> Handler<R> for CountingHandler<R> {
    fn handle(&self, request: R, _token: CancellationToken) -> BoxFuture<'static, Result<R::Response>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = (self.respond)(&request);
        let delay = self.delay;
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            outcome
        })
    }
}

/// Cache store whose every operation fails.
pub(crate) struct FailingCache;

impl CacheStore for FailingCache {
    fn get(&self, _key: &str) -> std::result::Result<Option<CacheValue>, CacheError> {
        Err(CacheError::Unavailable("offline".to_owned()))
    }

    fn set(
        &self,
        _key: &str,
        _value: CacheValue,
        _ttl: Option<Duration>,
    ) -> std::result::Result<(), CacheError> {
        Err(CacheError::Unavailable("offline".to_owned()))
    }

    fn remove(&self, _key: &str) -> std::result::Result<(), CacheError> {
        Err(CacheError::Unavailable("offline".to_owned()))
    }
}

/// In-memory sink for formatted log records.
#[derive(Clone, Default)]
pub(crate) struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Installs a thread-local subscriber writing into the returned buffer.
///
/// Only works on the current-thread runtime `#[tokio::test]` uses by default.
pub(crate) fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buffer, guard)
}
