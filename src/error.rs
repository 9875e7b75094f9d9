/// Failures at the record store boundary.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Transport, permission or query failure talking to the store
    #[error("record store unavailable: {0}")]
    Unavailable(String),
    /// A stored document could not be decoded
    #[error("stored record {id} is unreadable: {message}")]
    Corrupt { id: String, message: String },
    /// A document could not be serialized before it reached the store
    #[error("record could not be encoded: {0}")]
    Encode(String),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Unavailable(_) => "store_unavailable",
            StoreError::Corrupt { .. } => "store_corrupt",
            StoreError::Encode(_) => "encode_failed",
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}
