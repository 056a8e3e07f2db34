use tokio::sync::watch;
use tracing::debug;

/// One-shot "dependencies are ready" signal.
///
/// Cloning shares the same signal. Once marked ready it stays ready.
#[derive(Clone)]
pub struct ReadyBarrier {
    sender: watch::Sender<bool>,
}

impl ReadyBarrier {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self { sender }
    }

    /// A barrier that is already open
    pub fn ready() -> Self {
        let barrier = Self::new();
        barrier.mark_ready();
        barrier
    }

    pub fn mark_ready(&self) {
        let changed = self.sender.send_if_modified(|ready| {
            if *ready {
                false
            } else {
                *ready = true;
                true
            }
        });
        if changed {
            debug!("Ready barrier opened");
        }
    }

    pub fn is_ready(&self) -> bool {
        *self.sender.borrow()
    }

    /// Wait until the barrier opens
    pub async fn wait(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait
        let _ = receiver.wait_for(|ready| *ready).await;
    }
}

impl Default for ReadyBarrier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_resolves_after_mark_ready() {
        let barrier = ReadyBarrier::new();
        assert!(!barrier.is_ready());

        let waiter = {
            let barrier = barrier.clone();
            tokio::spawn(async move { barrier.wait().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        barrier.mark_ready();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish")
            .unwrap();
        assert!(barrier.is_ready());
    }

    #[tokio::test]
    async fn test_ready_barrier_does_not_block() {
        let barrier = ReadyBarrier::ready();
        tokio::time::timeout(Duration::from_millis(50), barrier.wait())
            .await
            .expect("already ready");

        // Marking twice is harmless
        barrier.mark_ready();
        assert!(barrier.is_ready());
    }
}
