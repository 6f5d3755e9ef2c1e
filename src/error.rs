//! Error types for the bookrank host.

/// Top-level error type for the bookrank host.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration file could not be parsed or failed validation.
    #[error("config error: {0}")]
    Config(String),

    /// Request or response JSON could not be decoded or encoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Fusion engine rejected the request.
    #[error("fusion error: {0}")]
    Fusion(#[from] bookrank_fusion::FusionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AppError>;
