//! Quiescence polling for incremental output collection.

use crate::buffer::OutputBuffer;
use hostshell_core::config::WaitConfig;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Floor for the poll period so a zero interval cannot spin.
const MIN_POLL: Duration = Duration::from_millis(1);

/// How long [`wait_for_quiescence`] may wait for output to settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Poll granularity.
    pub min_interval: Duration,

    /// Output must stop growing for this long to count as settled.
    pub settle_interval: Duration,

    /// Hard cap on the total wait.
    pub max_interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        WaitConfig::default().into()
    }
}

impl From<WaitConfig> for WaitOptions {
    fn from(config: WaitConfig) -> Self {
        Self {
            min_interval: Duration::from_millis(config.min_interval_ms),
            settle_interval: Duration::from_millis(config.settle_interval_ms),
            max_interval: Duration::from_millis(config.max_interval_ms),
        }
    }
}

impl WaitOptions {
    /// Create wait options.
    pub fn new(min_interval: Duration, settle_interval: Duration, max_interval: Duration) -> Self {
        Self {
            min_interval,
            settle_interval,
            max_interval,
        }
    }

    /// Options that return whatever is buffered without waiting.
    pub fn immediate() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO, Duration::ZERO)
    }
}

/// Wait until `output` has settled.
///
/// Returns once no new bytes have arrived for `settle_interval`, once the
/// output stream has closed, or once `max_interval` has elapsed, whichever
/// happens first. Never waits longer than `max_interval`.
pub async fn wait_for_quiescence(output: &OutputBuffer, options: &WaitOptions) {
    let start = Instant::now();
    let poll = options.min_interval.max(MIN_POLL);
    let mut last_len = output.len();
    let mut last_growth = start;

    loop {
        let progress = output.progress();
        let now = Instant::now();

        if progress.len != last_len {
            last_len = progress.len;
            last_growth = now;
        }

        if progress.stream_closed {
            break;
        }
        if now.duration_since(last_growth) >= options.settle_interval {
            break;
        }

        let elapsed = now.duration_since(start);
        if elapsed >= options.max_interval {
            break;
        }

        sleep(poll.min(options.max_interval - elapsed)).await;
    }
}
