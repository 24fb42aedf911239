use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    /// User input rejected before it touches the ledger.
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("no {collection} entry at index {index}")]
    NotFound {
        collection: &'static str,
        index: usize,
    },

    #[error("store error: {0}")]
    Store(#[from] finledger_store::StoreError),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
