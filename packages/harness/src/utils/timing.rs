// packages/harness/src/utils/timing.rs
//! Timing helpers for tests that wait out idle thresholds

use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::trace;

/// Some platforms wake timers early; sleeps are padded by this much
pub const SLEEP_PADDING: Duration = Duration::from_millis(15);

/// Sleep for at least `duration`, re-sleeping in padding-sized steps if the
/// timer woke up early
pub async fn sleep_at_least(duration: Duration) {
    let deadline = Instant::now() + duration;
    sleep(duration + SLEEP_PADDING).await;

    while Instant::now() < deadline {
        trace!("Timer woke early, sleeping another {:?}", SLEEP_PADDING);
        sleep(SLEEP_PADDING).await;
    }
}
