//! Error types for the bookrank-fusion crate.
//!
//! The fusion and merge stages are infallible; errors only arise from
//! configuration checks and from the external collaborators (channel
//! backends, exact-match lookups, rerankers) the retriever drives.

/// Errors that can occur while retrieving and fusing candidate lists.
#[derive(Debug, thiserror::Error)]
pub enum FusionError {
    /// Invalid retrieval configuration or request parameter.
    #[error("config error: {0}")]
    Config(String),

    /// A channel backend or exact-match lookup failed.
    #[error("channel error: {0}")]
    Channel(String),

    /// A channel did not respond within its timeout.
    #[error("channel timed out: {0}")]
    Timeout(String),

    /// The external reranker failed.
    #[error("rerank error: {0}")]
    Rerank(String),
}

/// Convenience type alias for bookrank-fusion results.
pub type Result<T> = std::result::Result<T, FusionError>;
