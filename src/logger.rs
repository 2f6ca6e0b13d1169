//! Destination of the writer's diagnostics.

use std::{fmt, io::Write};

use log::Level;
use parking_lot::Mutex;

pub const DEFAULT_LOG_TARGET: &str = "batchwriter";

/// Where flush failures and recovered panics are reported.
///
/// By default everything goes through the `log` facade. A [`Write`] stream can
/// be supplied instead, in which case each record becomes one prefixed line on
/// that stream.
pub enum LogSink {
    Log { target: &'static str },
    Writer(Mutex<Box<dyn Write + Send>>),
}

impl LogSink {
    pub fn writer(w: impl Write + Send + 'static) -> Self {
        LogSink::Writer(Mutex::new(Box::new(w)))
    }

    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        match self {
            LogSink::Log { target } => log::log!(target: *target, level, "{}", args),
            LogSink::Writer(w) => {
                let mut w = w.lock();
                // Nowhere left to report a broken log stream.
                let _ = writeln!(w, "{}: [{}] {}", DEFAULT_LOG_TARGET, level, args);
                let _ = w.flush();
            }
        }
    }

    #[inline]
    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args)
    }

    #[inline]
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        // Writer sinks only receive the two reportable categories.
        if let LogSink::Log { .. } = self {
            self.log(Level::Debug, args)
        }
    }
}

impl Default for LogSink {
    fn default() -> Self {
        LogSink::Log {
            target: DEFAULT_LOG_TARGET,
        }
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogSink::Log { target } => f.debug_struct("Log").field("target", target).finish(),
            LogSink::Writer(_) => f.write_str("Writer"),
        }
    }
}
