use std::time::Duration;

use serde_derive::{Deserialize, Serialize};

pub const DEFAULT_BUFFER_SIZE: usize = 1024;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_SETTLE_DURATION: Duration = Duration::from_millis(50);

/// Tuning knobs of a [`BatchingWriter`](crate::BatchingWriter).
///
/// # Example
///
/// ```rust,ignore
/// let writer = BatchingWriter::builder()
///     .config(BatchWriterConfig {
///         buffer_size: 500,
///         ..Default::default()
///     })
///     .handler(MyHandler::new())
///     .build()?;
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchWriterConfig {
    /// Capacity hint of the buffer, and the length at which a `write` flushes
    /// inline.
    ///
    /// Default: 1024
    pub buffer_size: usize,

    /// Period of the background flush.
    ///
    /// Default: 2s
    pub flush_interval: Duration,

    /// Shortest period the background timer is allowed to run at. Intervals
    /// below it (including zero) are raised to it.
    ///
    /// Default: 50ms
    pub settle_duration: Duration,
}

impl BatchWriterConfig {
    /// Period the background timer actually runs at for `interval`.
    #[inline]
    pub(crate) fn effective_period(&self, interval: Duration) -> Duration {
        interval.max(self.settle_duration).max(Duration::from_millis(1))
    }
}

impl Default for BatchWriterConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            settle_duration: DEFAULT_SETTLE_DURATION,
        }
    }
}
