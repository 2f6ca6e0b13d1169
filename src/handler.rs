use crate::error::BoxError;

/// Receives every batch the writer drains.
///
/// The batch is lent for the duration of the call only: the writer clears and
/// reuses the backing storage as soon as `flush` returns. Errors are logged and
/// the batch is dropped, there is no retry.
///
/// Flushes carry no timeout. A handler that hangs stalls the `write` that hit
/// the threshold, or `stop` during the final drain; wrap the downstream call
/// in its own timeout if shutdown latency must be bounded.
pub trait FlushHandler<T>: Send + Sync + 'static {
    fn flush(&self, batch: &[T]) -> Result<(), BoxError>;
}

impl<T, F, E> FlushHandler<T> for F
where
    F: Fn(&[T]) -> Result<(), E> + Send + Sync + 'static,
    E: Into<BoxError>,
{
    #[inline]
    fn flush(&self, batch: &[T]) -> Result<(), BoxError> {
        (self)(batch).map_err(Into::into)
    }
}

/// Discards every batch. Installed until a real handler is supplied.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

impl<T> FlushHandler<T> for NoopHandler {
    #[inline]
    fn flush(&self, _batch: &[T]) -> Result<(), BoxError> {
        Ok(())
    }
}
