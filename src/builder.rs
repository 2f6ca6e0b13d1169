use std::{io::Write, time::Duration};

use crate::{
    buffer::Shared,
    config::BatchWriterConfig,
    error::Error,
    handler::{FlushHandler, NoopHandler},
    logger::LogSink,
    BatchingWriter,
};

/// Options of a [`BatchingWriter`], applied in call order. Anything not set
/// keeps its [`BatchWriterConfig::default`] value.
#[must_use]
pub struct BatchWriterBuilder<T> {
    cfg: BatchWriterConfig,
    logger: LogSink,
    handler: Box<dyn FlushHandler<T>>,
}

impl<T: Send + 'static> BatchWriterBuilder<T> {
    pub fn new() -> Self {
        Self {
            cfg: BatchWriterConfig::default(),
            logger: LogSink::default(),
            handler: Box::new(NoopHandler),
        }
    }

    pub fn config(mut self, cfg: BatchWriterConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn buffer_size(mut self, size: usize) -> Self {
        self.cfg.buffer_size = size;
        self
    }

    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.cfg.flush_interval = interval;
        self
    }

    pub fn settle_duration(mut self, duration: Duration) -> Self {
        self.cfg.settle_duration = duration;
        self
    }

    /// Report diagnostics through the `log` facade under `target`.
    pub fn log_target(mut self, target: &'static str) -> Self {
        self.logger = LogSink::Log { target };
        self
    }

    /// Report diagnostics as lines on `w` instead of through `log`.
    pub fn log_writer(mut self, w: impl Write + Send + 'static) -> Self {
        self.logger = LogSink::writer(w);
        self
    }

    pub fn handler(mut self, handler: impl FlushHandler<T>) -> Self {
        self.handler = Box::new(handler);
        self
    }

    pub fn build(self) -> Result<BatchingWriter<T>, Error> {
        BatchingWriter::start(Shared::new(self.cfg, self.handler, self.logger))
    }
}

impl<T: Send + 'static> Default for BatchWriterBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}
