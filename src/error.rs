use thiserror::Error;

/// Error type returned by flush handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error<T = ()> {
    /// The writer was stopped; the rejected value is handed back.
    #[error("Writer is closed")]
    Closed(T),

    #[error("Spawn Error: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Flusher exited before it reported ready")]
    NotStarted,
}

impl<T> Error<T> {
    #[inline]
    pub fn is_closed(&self) -> bool {
        matches!(self, Error::Closed(_))
    }

    /// Recovers the item a closed writer refused to buffer.
    pub fn into_inner(self) -> Option<T> {
        match self {
            Error::Closed(inner) => Some(inner),
            _ => None,
        }
    }
}
