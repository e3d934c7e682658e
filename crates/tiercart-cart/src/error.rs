use thiserror::Error;

use tiercart_storefront::GatewayError;

/// Failure of a primary cart mutation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Rejected before any network call.
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("no active cart")]
    NoActiveCart,

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl StoreError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Gateway(e) if e.is_not_found())
    }
}

#[derive(Debug, Error)]
pub enum CartRefError {
    #[error("cart reference I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize cart reference: {0}")]
    Serialize(#[from] serde_json::Error),
}
