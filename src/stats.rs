//! Statistics for batching writers.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of a writer's counters.
///
/// Returned by [`BatchingWriter::stats()`](crate::BatchingWriter::stats).
///
/// # Example
///
/// ```rust,ignore
/// let stats = writer.stats();
/// println!("buffered: {}/{}", stats.buffered, stats.buffer_capacity);
/// println!("flushes: {} ({} failed)", stats.flushes, stats.failed_flushes);
/// ```
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Stats {
    /// Items currently waiting in the buffer.
    pub buffered: u64,

    /// Buffer length at which a `write` flushes inline.
    pub buffer_capacity: u64,

    /// Handler invocations, whatever their outcome.
    pub flushes: u64,

    /// Handler invocations that returned an error.
    pub failed_flushes: u64,

    /// Handler invocations that panicked.
    pub panics: u64,

    /// Items handed to the handler in total.
    pub items_flushed: u64,
}

#[derive(Debug, Default)]
pub(crate) struct WriterStats {
    pub buffered: AtomicU64,
    pub flushes: AtomicU64,
    pub failed_flushes: AtomicU64,
    pub panics: AtomicU64,
    pub items_flushed: AtomicU64,
}

impl WriterStats {
    pub fn snapshot(&self, buffer_capacity: usize) -> Stats {
        Stats {
            buffered: self.buffered.load(Ordering::SeqCst),
            buffer_capacity: buffer_capacity as _,
            flushes: self.flushes.load(Ordering::SeqCst),
            failed_flushes: self.failed_flushes.load(Ordering::SeqCst),
            panics: self.panics.load(Ordering::SeqCst),
            items_flushed: self.items_flushed.load(Ordering::SeqCst),
        }
    }
}
