use thiserror::Error;

/// Failures raised by a [`crate::RecordStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to connect to record store: {0}")]
    Connect(#[source] mongodb::error::Error),

    #[error(transparent)]
    Backend(#[from] mongodb::error::Error),

    #[error("record store unavailable: {0}")]
    Unavailable(String),
}
