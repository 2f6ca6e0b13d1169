//! Buffered writer that trades a bounded delay for batched downstream writes.
//!
//! Items passed to [`BatchingWriter::write`] accumulate in memory and are
//! handed to a [`FlushHandler`] when the buffer fills, when the flush interval
//! elapses, when a flush is requested, and one last time on
//! [`BatchingWriter::stop`].

mod buffer;
pub mod builder;
pub mod config;
pub mod error;
pub mod handler;
pub mod logger;
mod poller;
pub mod stats;
mod writer;

pub use builder::BatchWriterBuilder;
pub use config::BatchWriterConfig;
pub use error::{BoxError, Error};
pub use handler::{FlushHandler, NoopHandler};
pub use logger::LogSink;
pub use stats::Stats;
pub use writer::BatchingWriter;
