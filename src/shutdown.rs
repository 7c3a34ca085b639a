//! Cooperative shutdown signal shared by every task.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Flips once and wakes everyone waiting on it.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Idempotent.
    pub fn request(&self) {
        self.token.cancel();
    }

    #[inline]
    pub fn is_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolve once shutdown has been requested.
    pub async fn wait(&self) {
        self.token.cancelled().await;
    }

    /// Sleep for `duration` unless shutdown comes first.
    ///
    /// Returns `true` when the full duration elapsed and shutdown is still
    /// not requested, i.e. when the caller should go ahead.
    pub async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => !self.is_requested(),
            _ = self.token.cancelled() => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_returns_after_request() {
        let shutdown = Shutdown::new();
        let waiter = {
            let s = shutdown.clone();
            tokio::spawn(async move { s.wait().await })
        };
        tokio::task::yield_now().await;
        shutdown.request();
        waiter.await.unwrap();
        assert!(shutdown.is_requested());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_is_cut_short() {
        let shutdown = Shutdown::new();
        let s = shutdown.clone();
        let sleeper = tokio::spawn(async move { s.sleep(Duration::from_secs(60)).await });
        tokio::time::sleep(Duration::from_secs(1)).await;
        shutdown.request();
        assert!(!sleeper.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_completes_without_request() {
        let shutdown = Shutdown::new();
        assert!(shutdown.sleep(Duration::from_secs(10)).await);
    }
}
