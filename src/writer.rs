use std::{sync::Arc, thread::JoinHandle, time::Duration};

use parking_lot::{Mutex, Once};
use tokio::sync::{
    mpsc::{self, error::TrySendError},
    oneshot, watch,
};

use crate::{
    buffer::{Shared, Trigger},
    builder::BatchWriterBuilder,
    config::BatchWriterConfig,
    error::Error,
    handler::FlushHandler,
    poller::{self, Control},
    stats::Stats,
};

/// Accumulates items and hands them to a [`FlushHandler`] in batches.
///
/// A batch is flushed when any of these happens:
///
/// - a `write` brings the buffer up to `buffer_size` (flushed inline, on the
///   writing thread),
/// - the flush interval elapses,
/// - [`flush`](Self::flush) is requested,
/// - the writer is stopped (the final drain).
///
/// Every flush runs under the buffer lock, so at most one is in progress at a
/// time and items reach the handler in append order.
///
/// Handles are cheap to clone. The writer stops when [`stop`](Self::stop) is
/// called or the last handle is dropped.
///
/// # Example
///
/// ```rust,ignore
/// let writer = BatchingWriter::builder()
///     .buffer_size(500)
///     .flush_interval(Duration::from_secs(1))
///     .handler(|batch: &[Row]| db.insert_many(batch))
///     .build()?;
///
/// writer.write(row)?;
/// writer.stop();
/// ```
pub struct BatchingWriter<T: Send + 'static> {
    inner: Arc<WriterInner<T>>,
}

struct WriterInner<T: Send + 'static> {
    shared: Arc<Shared<T>>,
    flush_tx: mpsc::Sender<()>,
    close_tx: Mutex<Option<oneshot::Sender<()>>>,
    interval_tx: watch::Sender<Duration>,
    flusher: Mutex<Option<JoinHandle<()>>>,
    stopped: Once,
}

impl<T: Send + 'static> BatchingWriter<T> {
    pub fn builder() -> BatchWriterBuilder<T> {
        BatchWriterBuilder::new()
    }

    /// Writer with the default configuration, flushing into `handler`.
    pub fn new(handler: impl FlushHandler<T>) -> Result<Self, Error> {
        Self::builder().handler(handler).build()
    }

    /// Allocates the buffer and starts the flusher. Returns once the flusher
    /// is running.
    pub(crate) fn start(shared: Shared<T>) -> Result<Self, Error> {
        let shared = Arc::new(shared);
        let (flush_tx, flush_rx) = mpsc::channel(1);
        let (close_tx, close_rx) = oneshot::channel();
        let (interval_tx, interval_rx) = watch::channel(shared.cfg.flush_interval);
        let (ready_tx, ready_rx) = oneshot::channel();

        let flusher = poller::spawn(
            shared.clone(),
            Control {
                flush_rx,
                close_rx,
                interval_rx,
                ready_tx,
            },
        )?;

        if futures::executor::block_on(ready_rx).is_err() {
            let _ = flusher.join();
            return Err(Error::NotStarted);
        }

        Ok(Self {
            inner: Arc::new(WriterInner {
                shared,
                flush_tx,
                close_tx: Mutex::new(Some(close_tx)),
                interval_tx,
                flusher: Mutex::new(Some(flusher)),
                stopped: Once::new(),
            }),
        })
    }

    /// Buffers `item`.
    ///
    /// If this write fills the buffer, the batch is flushed before returning,
    /// on the calling thread. Once the writer has been drained the item is
    /// handed back in [`Error::Closed`].
    pub fn write(&self, item: T) -> Result<(), Error<T>> {
        let shared = &self.inner.shared;
        let len = shared.push(item).map_err(Error::Closed)?;

        if shared.is_full(len) {
            shared.flush(Trigger::Threshold);
        }

        Ok(())
    }

    /// Asks the flusher to flush as soon as it can. Does not wait for it.
    ///
    /// Requests made while one is still pending are merged into it.
    pub fn flush(&self) -> Result<(), Error> {
        if self.inner.shared.is_closed() {
            return Err(Error::Closed(()));
        }

        match self.inner.flush_tx.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => Ok(()),
            Err(TrySendError::Closed(())) => Err(Error::Closed(())),
        }
    }

    /// Replaces the flush interval. The next periodic flush happens
    /// `interval` from now; a flush already running is not affected.
    pub fn reset_flush_interval(&self, interval: Duration) -> Result<(), Error> {
        if self.inner.shared.is_closed() {
            return Err(Error::Closed(()));
        }

        self.inner
            .interval_tx
            .send(interval)
            .map_err(|_| Error::Closed(()))
    }

    pub fn flush_interval(&self) -> Duration {
        *self.inner.interval_tx.borrow()
    }

    #[inline]
    pub fn config(&self) -> &BatchWriterConfig {
        &self.inner.shared.cfg
    }

    #[inline]
    pub fn stats(&self) -> Stats {
        self.inner.shared.stats()
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.inner.shared.is_closed()
    }

    /// Drains the buffer into the handler and shuts the flusher down.
    ///
    /// Blocks until the final flush has completed. Concurrent and repeated
    /// calls all return after that same shutdown. Must not be called from
    /// inside the flush handler.
    pub fn stop(&self) {
        self.inner.stop()
    }
}

impl<T: Send + 'static> WriterInner<T> {
    fn stop(&self) {
        self.stopped.call_once(|| {
            if let Some(close_tx) = self.close_tx.lock().take() {
                let _ = close_tx.send(());
            }

            let flusher = self.flusher.lock().take();
            if let Some(flusher) = flusher {
                if flusher.join().is_err() {
                    self.shared
                        .logger
                        .error(format_args!("flusher thread terminated abnormally"));
                }
            }
        });
    }
}

impl<T: Send + 'static> Drop for WriterInner<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<T: Send + 'static> Clone for BatchingWriter<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}
