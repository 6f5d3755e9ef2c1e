//! Retrieval configuration with sensible defaults.
//!
//! [`RetrievalConfig`] controls the RRF constant, per-stage result sizes
//! and the per-channel timeout. Every field is defaulted so the struct
//! can be embedded in a partially-specified TOML file.

use serde::{Deserialize, Serialize};

use crate::error::FusionError;

/// Configuration for retrieval and fusion.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// RRF smoothing constant. Larger values flatten the influence of rank.
    pub rrf_k: u32,
    /// Result count for single-channel text search.
    pub top_k: usize,
    /// Records requested from each sub-query channel.
    pub per_query_top_k: usize,
    /// Records returned after fusion, merge and rerank.
    pub final_top_k: usize,
    /// Minimum rating applied by text search.
    pub min_rating: Option<f64>,
    /// Per-channel timeout in milliseconds.
    pub channel_timeout_ms: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            rrf_k: 60,
            top_k: 10,
            per_query_top_k: 20,
            final_top_k: 10,
            min_rating: None,
            channel_timeout_ms: 8_000,
        }
    }
}

impl RetrievalConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `rrf_k` must be greater than 0
    /// - `top_k`, `per_query_top_k` and `final_top_k` must be greater than 0
    /// - `channel_timeout_ms` must be greater than 0
    pub fn validate(&self) -> Result<(), FusionError> {
        validate_rrf_k(self.rrf_k)?;
        require_positive("top_k", self.top_k)?;
        require_positive("per_query_top_k", self.per_query_top_k)?;
        require_positive("final_top_k", self.final_top_k)?;
        if self.channel_timeout_ms == 0 {
            return Err(FusionError::Config(
                "channel_timeout_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Reject a non-positive RRF constant.
pub fn validate_rrf_k(rrf_k: u32) -> Result<(), FusionError> {
    if rrf_k == 0 {
        return Err(FusionError::Config("rrf_k must be greater than 0".into()));
    }
    Ok(())
}

/// Reject a zero result-size parameter.
pub fn require_positive(name: &str, value: usize) -> Result<(), FusionError> {
    if value == 0 {
        return Err(FusionError::Config(format!(
            "{name} must be greater than 0"
        )));
    }
    Ok(())
}
