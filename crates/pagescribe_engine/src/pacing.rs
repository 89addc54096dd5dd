use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::fetch::millis;

/// Bounds of the random delay inserted before each item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacingWindow {
    #[serde(with = "millis")]
    pub min: Duration,
    #[serde(with = "millis")]
    pub max: Duration,
}

impl PacingWindow {
    pub const fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    pub const fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// The novel site gets throttled at anything faster.
    pub const fn novel() -> Self {
        Self::new(Duration::from_millis(2000), Duration::from_millis(4000))
    }

    pub const fn url_list() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(3))
    }

    /// Uniform sample in `[min, max]`; inverted bounds are swapped.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let (lo, hi) = if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        };
        if lo == hi {
            return lo;
        }
        let millis = rng.gen_range(lo.as_millis() as u64..=hi.as_millis() as u64);
        Duration::from_millis(millis)
    }
}

/// Suspends the run for a random delay. Returns how long it waited.
pub async fn pace(window: PacingWindow) -> Duration {
    let delay = window.sample(&mut rand::thread_rng());
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    delay
}
