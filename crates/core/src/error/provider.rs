use thiserror::Error;

/// Failure reported by a cloud provider call, classified by cause.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("authentication failed")]
    Authentication,

    #[error("authorization denied: {operation}")]
    Authorization { operation: String },

    #[error("rate limit or quota exceeded")]
    Quota,

    #[error("transient error during {operation_name}")]
    Transient {
        operation_name: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("unexpected error during {operation_name}: {detail}")]
    Unknown {
        operation_name: &'static str,
        detail: String,
    },
}
