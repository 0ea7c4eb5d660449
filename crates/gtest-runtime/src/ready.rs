//! Environment-ready signal awaited by `start()` before anything runs

use futures_util::future::LocalBoxFuture;
use futures_util::FutureExt;
use std::fmt;
use std::future::Future;
use tokio::sync::oneshot;

/// Completes when the host environment is ready to run tests
pub struct ReadySignal {
    inner: Option<LocalBoxFuture<'static, ()>>,
}

impl ReadySignal {
    /// Already ready
    pub fn immediate() -> Self {
        Self { inner: None }
    }

    /// Ready when `future` resolves
    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = ()> + 'static,
    {
        Self {
            inner: Some(future.boxed_local()),
        }
    }

    /// A signal fired by the returned trigger.
    ///
    /// Dropping the trigger without firing it also releases the signal.
    pub fn channel() -> (ReadyTrigger, ReadySignal) {
        let (tx, rx) = oneshot::channel();
        let signal = ReadySignal::from_future(async move {
            if rx.await.is_err() {
                tracing::warn!("ready trigger dropped without firing, starting anyway");
            }
        });
        (ReadyTrigger { tx }, signal)
    }

    pub fn is_immediate(&self) -> bool {
        self.inner.is_none()
    }

    pub(crate) async fn wait(self) {
        if let Some(inner) = self.inner {
            inner.await;
        }
    }
}

impl Default for ReadySignal {
    fn default() -> Self {
        Self::immediate()
    }
}

impl fmt::Debug for ReadySignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadySignal")
            .field("immediate", &self.is_immediate())
            .finish()
    }
}

/// Fires a [`ReadySignal`] created by [`ReadySignal::channel`]
#[derive(Debug)]
pub struct ReadyTrigger {
    tx: oneshot::Sender<()>,
}

impl ReadyTrigger {
    pub fn fire(self) {
        // The harness may have been dropped already; nothing to release then.
        let _ = self.tx.send(());
    }
}
