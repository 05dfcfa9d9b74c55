//! Per-dispatch context: cooperative cancellation and deadlines.
//!
//! Every call to [`Mediator::send`](crate::mediator::Mediator::send) carries a
//! [`CancellationToken`]. The token travels through every layer of the chain down to
//! the concrete handler, which may poll [`CancellationToken::is_cancelled`] or await
//! [`CancellationToken::cancelled`] around its I/O.
//!
//! A token fires when either:
//!
//! - its [`CancelHandle`] is cancelled (or dropped after cancelling), or
//! - its deadline, set with [`CancellationToken::with_timeout`] or
//!   [`CancellationToken::with_deadline`], elapses.
//!
//! Tokens are cheap to clone; every clone observes the same cancellation.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, sleep_until};

use crate::error::{Error, Result};

/// The sending half of a cancellation pair.
///
/// Dropping the handle without calling [`cancel`](Self::cancel) does **not** cancel
/// the paired token.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Signal cancellation to every clone of the paired token.
    ///
    /// Calling `cancel` more than once is a no-op.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// A cooperative cancellation and timeout signal for one dispatch.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use rmediator::context::CancellationToken;
///
/// let (handle, token) = CancellationToken::new();
/// let token = token.with_timeout(Duration::from_secs(30));
/// assert!(!token.is_cancelled());
///
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    // `None` for tokens that can only fire through their deadline.
    rx: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::never()
    }
}

impl CancellationToken {
    /// Creates a linked `(handle, token)` pair with no deadline.
    pub fn new() -> (CancelHandle, Self) {
        let (tx, rx) = watch::channel(false);
        let token = Self {
            rx: Some(rx),
            deadline: None,
        };
        (CancelHandle { tx }, token)
    }

    /// A token that is never cancelled explicitly and has no deadline.
    ///
    /// A deadline can still be attached afterwards with [`with_timeout`](Self::with_timeout).
    pub fn never() -> Self {
        Self {
            rx: None,
            deadline: None,
        }
    }

    /// Returns a copy of this token that also fires `timeout` from now.
    ///
    /// If the token already carries an earlier deadline, the earlier one is kept. A
    /// timeout too large to represent as an instant adds no deadline.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Returns a copy of this token that also fires at `deadline`.
    ///
    /// The earliest of the existing and the new deadline wins.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// The deadline attached to this token, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns `true` if the deadline has been reached.
    pub fn deadline_elapsed(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Returns `true` if the token was cancelled explicitly or its deadline elapsed.
    pub fn is_cancelled(&self) -> bool {
        self.explicitly_cancelled() || self.deadline_elapsed()
    }

    /// Returns an error describing why the token fired, or `Ok(())` if it has not.
    ///
    /// Handlers call this before committing side effects:
    ///
    /// ```rust,ignore
    /// token.check(CreateUser::name())?;
    /// repo.insert(&user).await?;
    /// ```
    ///
    /// # Errors
    ///
    /// [`Error::TimedOut`] once the deadline has elapsed, otherwise
    /// [`Error::Cancelled`] if the token was cancelled explicitly.
    pub fn check(&self, request_type: &'static str) -> Result<()> {
        if self.deadline_elapsed() {
            Err(Error::TimedOut { request_type })
        } else if self.explicitly_cancelled() {
            Err(Error::Cancelled { request_type })
        } else {
            Ok(())
        }
    }

    fn explicitly_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once the token is cancelled or its deadline elapses.
    ///
    /// For a token created with [`never`](Self::never) and no deadline this future
    /// never resolves.
    pub async fn cancelled(&self) {
        let explicit = async {
            match self.rx.clone() {
                Some(mut rx) => {
                    // An error means the handle was dropped without cancelling.
                    let handle_dropped = rx.wait_for(|cancelled| *cancelled).await.is_err();
                    if handle_dropped {
                        std::future::pending::<()>().await;
                    }
                }
                None => std::future::pending::<()>().await,
            }
        };

        let deadline = async {
            match self.deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            () = explicit => {}
            () = deadline => {}
        }
    }
}
