//! Write-once value holders handed to the UI.
//!
//! Each request operation returns an [`Observable`] immediately and keeps the
//! matching [`Publisher`] on the worker task.  The publisher sets the value at
//! most once; if the operation fails it is simply dropped and the observable
//! stays empty.
//!
//! Subscribers either poll with [`Observable::get`] (the viewer does this once
//! per frame) or await [`Observable::wait`].

use std::sync::Arc;

use tokio::sync::watch;

/// Create a connected publisher/observable pair, initially unset.
pub fn channel<T>() -> (Publisher<T>, Observable<T>) {
    let (tx, rx) = watch::channel(None);
    (Publisher { tx }, Observable { rx })
}

/// Sending half.  Consumed by [`publish`](Publisher::publish).
#[derive(Debug)]
pub struct Publisher<T> {
    tx: watch::Sender<Option<Arc<T>>>,
}

impl<T> Publisher<T> {
    /// Set the value.  Succeeds even if every observer has gone away.
    pub fn publish(self, value: T) {
        self.tx.send_replace(Some(Arc::new(value)));
    }
}

/// Receiving half.  Clones observe the same value.
#[derive(Debug, Clone)]
pub struct Observable<T> {
    rx: watch::Receiver<Option<Arc<T>>>,
}

impl<T> Observable<T> {
    /// The published value, if any yet.
    pub fn get(&self) -> Option<Arc<T>> {
        self.rx.borrow().clone()
    }

    pub fn is_set(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Wait for the value.
    ///
    /// Resolves with `None` once the operation has finished without publishing
    /// anything; callers that only use [`get`](Self::get) never see that
    /// distinction.
    pub async fn wait(&mut self) -> Option<Arc<T>> {
        if let Ok(value) = self.rx.wait_for(Option::is_some).await {
            return value.clone();
        }
        self.rx.borrow().clone()
    }
}
