// Randomized pacing between outbound requests.
//
// Every fetch in a crawl sequence (listing page, thread detail, comment page)
// and every reply candidate is preceded or followed by a uniformly random
// sleep inside a configured window, so the request pattern looks like a
// person browsing rather than a tight loop.
//
// The random source is created once per process and handed to whoever
// needs it; there is no global RNG state.

use std::sync::Mutex;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// An inclusive `[min, max]` delay window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaceWindow {
    pub min: Duration,
    pub max: Duration,
}

impl PaceWindow {
    pub fn from_millis(min: u64, max: u64) -> Self {
        Self {
            min: Duration::from_millis(min),
            max: Duration::from_millis(max),
        }
    }

    pub fn from_secs(min: u64, max: u64) -> Self {
        Self {
            min: Duration::from_secs(min),
            max: Duration::from_secs(max),
        }
    }

    /// No delay at all.
    pub fn none() -> Self {
        Self::from_millis(0, 0)
    }
}

/// Shared source of pacing delays.
pub struct Pacer {
    rng: Mutex<StdRng>,
}

impl Pacer {
    /// Seed from the operating system. Call once at startup.
    pub fn from_os_rng() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Deterministic pacer for tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Pick a delay uniformly from the window. A window whose max is not
    /// above its min always yields the min.
    pub fn jitter(&self, window: PaceWindow) -> Duration {
        if window.max <= window.min {
            return window.min;
        }
        let min_ms = window.min.as_millis() as u64;
        let max_ms = window.max.as_millis() as u64;
        // A poisoned lock still holds a usable RNG
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        Duration::from_millis(rng.random_range(min_ms..=max_ms))
    }

    /// Sleep for a random duration inside the window.
    pub async fn pace(&self, window: PaceWindow) {
        let delay = self.jitter(window);
        if delay.is_zero() {
            return;
        }
        debug!(delay_ms = delay.as_millis() as u64, "Pacing");
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jitter_stays_inside_window() {
        let pacer = Pacer::seeded(7);
        let window = PaceWindow::from_millis(2500, 7500);
        for _ in 0..500 {
            let d = pacer.jitter(window);
            assert!(d >= window.min && d <= window.max, "{d:?} outside window");
        }
    }

    #[test]
    fn test_jitter_varies() {
        let pacer = Pacer::seeded(42);
        let window = PaceWindow::from_millis(0, 10_000);
        let first = pacer.jitter(window);
        let differs = (0..20).any(|_| pacer.jitter(window) != first);
        assert!(differs);
    }

    #[test]
    fn test_degenerate_window_returns_min() {
        let pacer = Pacer::seeded(1);
        assert_eq!(
            pacer.jitter(PaceWindow::from_millis(300, 300)),
            Duration::from_millis(300)
        );
        assert_eq!(
            pacer.jitter(PaceWindow::from_millis(300, 100)),
            Duration::from_millis(300)
        );
        assert_eq!(pacer.jitter(PaceWindow::none()), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_pace_sleeps_for_window() {
        let pacer = Pacer::seeded(3);
        let start = tokio::time::Instant::now();
        pacer.pace(PaceWindow::from_millis(40, 40)).await;
        assert!(start.elapsed() >= Duration::from_millis(40));
    }
}
