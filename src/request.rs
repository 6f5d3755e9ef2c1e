//! JSON request and response envelopes for offline fusion.
//!
//! A [`FuseRequest`] carries channel lists that were already retrieved
//! elsewhere; [`run_fuse_request`] runs fuse → merge → truncate over them
//! without calling any backend.

use bookrank_fusion::fusion::fusable_count;
use bookrank_fusion::{CandidateRecord, ChannelReport, RetrievalConfig};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One pre-ranked channel, best record first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelInput {
    /// Channel (sub-query) name.
    pub name: String,
    /// Ranked records.
    #[serde(default)]
    pub records: Vec<CandidateRecord>,
}

/// Offline fusion request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuseRequest {
    /// Ranked channels to fuse.
    pub channels: Vec<ChannelInput>,
    /// Exact-match hits to merge after fusion.
    pub exact_matches: Vec<CandidateRecord>,
    /// Overrides the configured `final_top_k`.
    pub final_top_k: Option<usize>,
}

/// Offline fusion response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuseResponse {
    /// Fused, merged, truncated records.
    pub results: Vec<CandidateRecord>,
    /// Records each channel contributed to fusion, in request order.
    pub channels: Vec<ChannelReport>,
}

/// Run fuse → merge → truncate over a request.
///
/// # Errors
///
/// Returns [`crate::AppError::Fusion`] if the effective configuration is
/// invalid, e.g. `final_top_k = 0`.
pub fn run_fuse_request(request: FuseRequest, config: &RetrievalConfig) -> Result<FuseResponse> {
    let mut config = config.clone();
    if let Some(final_top_k) = request.final_top_k {
        config.final_top_k = final_top_k;
    }

    let channels: Vec<ChannelReport> = request
        .channels
        .iter()
        .map(|c| ChannelReport::succeeded(c.name.clone(), fusable_count(&c.records)))
        .collect();

    let mut exact_matches = request.exact_matches;
    for record in &mut exact_matches {
        record.exact_match_score.get_or_insert(1.0);
    }

    let results = bookrank_fusion::fuse_and_merge(
        request.channels.into_iter().map(|c| (c.name, c.records)),
        exact_matches,
        &config,
    )?;

    tracing::info!(
        channels = channels.len(),
        returned = results.len(),
        "fuse request complete"
    );

    Ok(FuseResponse { results, channels })
}
