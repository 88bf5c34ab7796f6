//! Caller-supplied cancellation context.
//!
//! A [`Context`] is a read-only view of a flag that its [`CancelHandle`] can
//! raise. The storage adapter consults it once before touching the database;
//! a query that has already started always runs to completion.
//!
//! HTTP handlers hold their handle for their whole lifetime. A dropped request
//! drops the storage call together with the handle, so over HTTP the flag is
//! never read after it flips; it matters to callers that cancel before calling in.

use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct Context {
    cancelled: watch::Receiver<bool>,
}

/// Raises the cancellation flag of its [`Context`] on `cancel()` or on drop.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl Context {
    pub fn new() -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        (Self { cancelled: rx }, CancelHandle { tx })
    }

    /// A context nobody can cancel.
    pub fn background() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { cancelled: rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }
}

impl CancelHandle {
    pub fn cancel(&self) {
        // send_replace works even when every receiver is gone
        self.tx.send_replace(true);
    }
}

impl Drop for CancelHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
