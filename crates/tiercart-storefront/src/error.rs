use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The cart id is unknown to the backend or has expired.
    #[error("cart not found: {cart_id}")]
    NotFound { cart_id: String },

    #[error("rate limited by storefront (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("GraphQL error in {operation}: {messages}")]
    Graphql {
        operation: &'static str,
        messages: String,
    },

    /// The mutation was rejected by the backend (e.g. variant unavailable).
    #[error("{operation} rejected: {messages}")]
    UserErrors {
        operation: &'static str,
        messages: String,
    },

    #[error("{operation} returned neither a cart nor user errors")]
    MissingCart { operation: &'static str },

    #[error("invalid store URL \"{store_url}\": {reason}")]
    InvalidStoreUrl { store_url: String, reason: String },
}

impl GatewayError {
    /// `true` for the outcome callers recover from by discarding their
    /// stored cart reference.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound { .. })
    }
}
