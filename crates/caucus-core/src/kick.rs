//! Startup kick timer
//!
//! Shared-map state that existed before a Caucus subscribed never arrives
//! as change events. A single delayed refresh after connecting covers that
//! gap.

use crate::error::{CaucusError, CaucusResult};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Single-shot delayed callback on the current tokio runtime
///
/// Aborted on [`cancel`](Self::cancel) or drop.
#[derive(Debug)]
pub struct KickTimer {
    handle: JoinHandle<()>,
}

impl KickTimer {
    /// Run `on_fire` once after `delay`
    ///
    /// # Errors
    /// Returns [`CaucusError::NoRuntime`] when called outside a tokio runtime
    pub fn spawn<F>(delay: Duration, on_fire: F) -> CaucusResult<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| CaucusError::NoRuntime)?;
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            on_fire();
        });
        Ok(Self { handle })
    }

    /// Abort if still pending
    #[inline]
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Check if the timer fired or was cancelled
    #[inline]
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for KickTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn requires_runtime() {
        let result = KickTimer::spawn(Duration::from_millis(1), || {});
        assert!(matches!(result, Err(CaucusError::NoRuntime)));
    }

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let timer = KickTimer::spawn(Duration::from_millis(250), move || {
            flag.store(true, Ordering::SeqCst);
        })
        .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!fired.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(fired.load(Ordering::SeqCst));
        assert!(timer.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_fire() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let timer = KickTimer::spawn(Duration::from_millis(250), move || {
            flag.store(true, Ordering::SeqCst);
        })
        .unwrap();

        timer.cancel();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn drop_prevents_fire() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        drop(
            KickTimer::spawn(Duration::from_millis(250), move || {
                flag.store(true, Ordering::SeqCst);
            })
            .unwrap(),
        );

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }
}
