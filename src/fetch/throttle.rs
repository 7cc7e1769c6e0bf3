use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// Enforces a minimum spacing between consecutive outbound calls.
///
/// The lock is held while waiting, so callers queue up and go out one at a
/// time. There is one throttle per process, not one per key or caller.
pub struct Throttle {
    min_spacing: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(min_spacing: Duration) -> Self {
        Self {
            min_spacing,
            last_call: Mutex::new(None),
        }
    }

    pub fn min_spacing(&self) -> Duration {
        self.min_spacing
    }

    /// Waits until `min_spacing` has passed since the previous call, then
    /// claims the slot.
    pub async fn wait_turn(&self) {
        let mut last_call = self.last_call.lock().await;
        if let Some(last) = *last_call {
            let ready_at = last + self.min_spacing;
            if ready_at > Instant::now() {
                debug!(
                    "Throttle: waiting {:?} before next outbound call",
                    ready_at - Instant::now()
                );
                sleep_until(ready_at).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn assert_about(actual: Duration, expected: Duration) {
        assert!(
            actual >= expected && actual < expected + Duration::from_millis(50),
            "expected about {:?}, got {:?}",
            expected,
            actual
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_call_does_not_wait() {
        let throttle = Throttle::new(Duration::from_secs(1));
        let start = Instant::now();
        throttle.wait_turn().await;
        assert_about(Instant::now() - start, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_calls_are_spaced() {
        let throttle = Throttle::new(Duration::from_secs(1));
        let start = Instant::now();
        throttle.wait_turn().await;
        throttle.wait_turn().await;
        throttle.wait_turn().await;
        assert_about(Instant::now() - start, Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_after_spacing_elapsed() {
        let throttle = Throttle::new(Duration::from_millis(500));
        throttle.wait_turn().await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        let before = Instant::now();
        throttle.wait_turn().await;
        assert_about(Instant::now() - before, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_are_serialized() {
        let throttle = Arc::new(Throttle::new(Duration::from_secs(1)));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let throttle = throttle.clone();
            handles.push(tokio::spawn(async move {
                throttle.wait_turn().await;
                Instant::now() - start
            }));
        }

        let mut offsets = Vec::new();
        for handle in handles {
            offsets.push(handle.await.unwrap());
        }
        offsets.sort();
        for (i, offset) in offsets.into_iter().enumerate() {
            assert_about(offset, Duration::from_secs(i as u64));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_spacing_never_sleeps() {
        let throttle = Throttle::new(Duration::ZERO);
        let start = Instant::now();
        for _ in 0..5 {
            throttle.wait_turn().await;
        }
        assert_about(Instant::now() - start, Duration::ZERO);
    }
}
