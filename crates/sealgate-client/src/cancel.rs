//! View-lifetime cancellation.
//!
//! Polling loops and decrypt batches are owned by a view; when the view
//! is torn down, its [`Canceller`] stops the background work
//! deterministically. Individual in-flight reads are not interrupted,
//! but no new work is scheduled after cancellation.

use tokio::sync::watch;

/// The owning side: cancels all tokens derived from it.
pub struct Canceller {
    tx: watch::Sender<bool>,
}

impl Canceller {
    /// Create a new canceller.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Derive a token observing this canceller.
    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: Some(self.tx.subscribe()),
        }
    }

    /// Cancel. Idempotent.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl Default for Canceller {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Canceller {
    fn drop(&mut self) {
        let _ = self.tx.send(true);
    }
}

/// Observer side of a [`Canceller`].
#[derive(Clone)]
pub struct CancelToken {
    /// `None` means never cancelled (direct, non-polling calls).
    rx: Option<watch::Receiver<bool>>,
}

impl CancelToken {
    /// A token that is never cancelled, for direct (non-polling) calls.
    pub fn never() -> Self {
        Self { rx: None }
    }

    /// Whether the owning view has been torn down.
    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolve once the owning view is torn down. Never resolves for a
    /// [`CancelToken::never`] token.
    pub async fn cancelled(&self) {
        match &self.rx {
            None => std::future::pending::<()>().await,
            Some(rx) => {
                let mut rx = rx.clone();
                loop {
                    if *rx.borrow() {
                        return;
                    }
                    // A closed channel means the canceller was dropped,
                    // which also counts as teardown.
                    if rx.changed().await.is_err() {
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_propagates() {
        let canceller = Canceller::new();
        let token = canceller.token();
        assert!(!token.is_cancelled());
        canceller.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_drop_cancels() {
        let canceller = Canceller::new();
        let token = canceller.token();
        drop(canceller);
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_never_token() {
        let token = CancelToken::never();
        assert!(!token.is_cancelled());
    }
}
