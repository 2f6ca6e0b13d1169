use std::{
    any::Any,
    backtrace::Backtrace,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::atomic::{AtomicBool, Ordering},
};

use parking_lot::Mutex;

use crate::{
    config::BatchWriterConfig, handler::FlushHandler, logger::LogSink, stats::WriterStats, Stats,
};

/// What caused a flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Trigger {
    Threshold,
    Periodic,
    Requested,
    Drain,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Trigger::Threshold => "threshold",
            Trigger::Periodic => "periodic",
            Trigger::Requested => "requested",
            Trigger::Drain => "drain",
        })
    }
}

struct Buffer<T> {
    items: Vec<T>,
    closed: bool,
}

/// State shared between writer handles and the background flusher.
pub(crate) struct Shared<T> {
    buffer: Mutex<Buffer<T>>,
    handler: Box<dyn FlushHandler<T>>,
    // Mirrors `Buffer::closed` for readers that must not wait on a flush.
    closed: AtomicBool,
    pub(crate) cfg: BatchWriterConfig,
    pub(crate) logger: LogSink,
    stats: WriterStats,
}

impl<T: Send + 'static> Shared<T> {
    pub fn new(cfg: BatchWriterConfig, handler: Box<dyn FlushHandler<T>>, logger: LogSink) -> Self {
        Self {
            buffer: Mutex::new(Buffer {
                items: Vec::with_capacity(cfg.buffer_size),
                closed: false,
            }),
            handler,
            closed: AtomicBool::new(false),
            cfg,
            logger,
            stats: WriterStats::default(),
        }
    }

    /// Appends `item` and returns the buffer length observed right after.
    /// A drained buffer refuses the item and hands it back.
    pub fn push(&self, item: T) -> Result<usize, T> {
        let mut buffer = self.buffer.lock();
        if buffer.closed {
            return Err(item);
        }

        buffer.items.push(item);
        let len = buffer.items.len();
        self.stats.buffered.store(len as _, Ordering::SeqCst);

        Ok(len)
    }

    #[inline]
    pub fn is_full(&self, len: usize) -> bool {
        len >= self.cfg.buffer_size
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> Stats {
        self.stats.snapshot(self.cfg.buffer_size)
    }

    /// The one flush every trigger goes through.
    ///
    /// The lock is held across the handler call, so flushes never overlap and
    /// no `write` can slip items in between the handler call and the clear.
    /// A `Drain` flush also closes the buffer for good.
    pub fn flush(&self, trigger: Trigger) {
        let mut buffer = self.buffer.lock();
        if trigger == Trigger::Drain {
            buffer.closed = true;
            self.closed.store(true, Ordering::SeqCst);
        }

        if buffer.items.is_empty() {
            return;
        }

        let count = buffer.items.len();
        let outcome = {
            let items = &buffer.items;
            let handler = &self.handler;
            panic::catch_unwind(AssertUnwindSafe(|| handler.flush(items)))
        };

        buffer.items.clear();
        self.stats.buffered.store(0, Ordering::SeqCst);
        self.stats.flushes.fetch_add(1, Ordering::SeqCst);
        self.stats
            .items_flushed
            .fetch_add(count as _, Ordering::SeqCst);
        drop(buffer);

        match outcome {
            Ok(Ok(())) => self
                .logger
                .debug(format_args!("{} flush of {} items done", trigger, count)),

            Ok(Err(err)) => {
                self.stats.failed_flushes.fetch_add(1, Ordering::SeqCst);
                self.logger.error(format_args!(
                    "{} flush of {} items failed due to {}",
                    trigger, count, err
                ));
            }

            Err(payload) => {
                self.stats.panics.fetch_add(1, Ordering::SeqCst);
                self.logger.error(format_args!(
                    "catch exception: {}, panic recovered during {} flush of {} items with stack:\n{}",
                    panic_message(&*payload),
                    trigger,
                    count,
                    Backtrace::force_capture()
                ));
            }
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        *msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "Box<dyn Any>"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::BoxError;

    struct Recorder(Arc<Mutex<Vec<Vec<u32>>>>);

    impl FlushHandler<u32> for Recorder {
        fn flush(&self, batch: &[u32]) -> Result<(), BoxError> {
            if batch.contains(&13) {
                panic!("unlucky batch");
            }

            self.0.lock().push(batch.to_vec());
            Ok(())
        }
    }

    fn shared(batches: &Arc<Mutex<Vec<Vec<u32>>>>) -> Shared<u32> {
        Shared::new(
            BatchWriterConfig {
                buffer_size: 3,
                ..Default::default()
            },
            Box::new(Recorder(batches.clone())),
            LogSink::default(),
        )
    }

    #[test]
    fn test_push_reports_length() {
        let batches = Arc::new(Mutex::new(Vec::new()));
        let shared = shared(&batches);

        assert_eq!(shared.push(1), Ok(1));
        assert_eq!(shared.push(2), Ok(2));
        assert!(!shared.is_full(2));
        assert_eq!(shared.push(3), Ok(3));
        assert!(shared.is_full(3));
        assert_eq!(shared.stats().buffered, 3);
    }

    #[test]
    fn test_empty_flush_is_noop() {
        let batches = Arc::new(Mutex::new(Vec::new()));
        let shared = shared(&batches);

        shared.flush(Trigger::Periodic);
        shared.flush(Trigger::Requested);

        assert!(batches.lock().is_empty());
        assert_eq!(shared.stats().flushes, 0);
    }

    #[test]
    fn test_drain_closes_buffer() {
        let batches = Arc::new(Mutex::new(Vec::new()));
        let shared = shared(&batches);

        shared.push(7).unwrap();
        shared.flush(Trigger::Drain);

        assert!(shared.is_closed());
        assert_eq!(shared.push(8), Err(8));
        assert_eq!(batches.lock().as_slice(), &[vec![7]]);
    }

    #[test]
    fn test_panicking_handler_drops_batch() {
        let batches = Arc::new(Mutex::new(Vec::new()));
        let shared = shared(&batches);

        shared.push(12).unwrap();
        shared.push(13).unwrap();
        shared.flush(Trigger::Threshold);

        shared.push(14).unwrap();
        shared.flush(Trigger::Requested);

        let stats = shared.stats();
        assert_eq!(stats.panics, 1);
        assert_eq!(stats.flushes, 2);
        assert_eq!(stats.buffered, 0);
        assert_eq!(batches.lock().as_slice(), &[vec![14]]);
    }

    #[test]
    fn test_panic_message() {
        let payload = std::panic::catch_unwind(|| panic!("static")).unwrap_err();
        assert_eq!(panic_message(&*payload), "static");

        let payload = std::panic::catch_unwind(|| panic!("formatted {}", 1)).unwrap_err();
        assert_eq!(panic_message(&*payload), "formatted 1");
    }
}
