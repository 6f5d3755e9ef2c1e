//! # bookrank-fusion
//!
//! Rank fusion and deduplication for the book-retrieval pipeline.
//!
//! This crate takes several independently-ranked candidate lists (one per
//! retrieval channel / sub-query) plus an optional list of exact-match
//! hits, and produces one ranked, deduplicated result list. It performs no
//! embedding, makes no network calls of its own and keeps no state.
//!
//! ## Design
//!
//! - Reciprocal Rank Fusion across channels, collapsing on `book_id`
//! - Exact-match merge with a second collapse on normalised `call_no`
//! - One shared recency rule decides which snapshot survives a collision
//! - The [`Retriever`] fans sub-queries out concurrently; a failed or
//!   timed-out channel contributes nothing instead of failing the request
//!
//! Channel backends, exact-match lookups and rerankers are external and
//! plug in through the traits in [`channel`].

pub mod channel;
pub mod config;
pub mod error;
pub mod fusion;
pub mod retriever;
pub mod types;

pub use channel::{ChannelSearch, ExactMatchLookup, NoExactMatch, NoReranker, Reranker};
pub use config::RetrievalConfig;
pub use error::{FusionError, Result};
pub use fusion::{combine_scores, is_newer, merge_exact_matches, FusionStats, RrfFusion};
pub use retriever::Retriever;
pub use types::{
    CandidateRecord, ChannelReport, EvaluationLogic, QueryPackage, RetrievalOutcome,
    ScreeningVerdict, SubQuery,
};

/// Fuse pre-ranked channels, merge exact matches and truncate.
///
/// Runs the pure part of the pipeline without any channel calls: RRF with
/// `config.rrf_k`, the call-number merge, then truncation to
/// `config.final_top_k`.
///
/// # Errors
///
/// Returns [`FusionError::Config`] if `config` fails validation.
///
/// # Examples
///
/// ```
/// use bookrank_fusion::{fuse_and_merge, CandidateRecord, RetrievalConfig};
///
/// let primary = vec![CandidateRecord::new(1), CandidateRecord::new(2)];
/// let tags = vec![CandidateRecord::new(2), CandidateRecord::new(1)];
/// let results = fuse_and_merge(
///     vec![("primary", primary), ("tags", tags)],
///     Vec::new(),
///     &RetrievalConfig::default(),
/// )?;
/// assert_eq!(results.len(), 2);
/// assert_eq!(results[0].book_id, Some(1));
/// # Ok::<(), bookrank_fusion::FusionError>(())
/// ```
pub fn fuse_and_merge<I, S>(
    channels: I,
    exact_matches: Vec<CandidateRecord>,
    config: &RetrievalConfig,
) -> Result<Vec<CandidateRecord>>
where
    I: IntoIterator<Item = (S, Vec<CandidateRecord>)>,
    S: AsRef<str>,
{
    config.validate()?;
    let fused = RrfFusion::new(config.rrf_k)?.fuse(channels);
    let mut merged = merge_exact_matches(fused, exact_matches);
    merged.truncate(config.final_top_k);
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(ids: &[i64]) -> Vec<CandidateRecord> {
        ids.iter().map(|&id| CandidateRecord::new(id)).collect()
    }

    #[test]
    fn fuse_and_merge_validates_config_zero_rrf_k() {
        let config = RetrievalConfig {
            rrf_k: 0,
            ..Default::default()
        };
        let result = fuse_and_merge(vec![("a", channel(&[1]))], vec![], &config);
        assert!(result.unwrap_err().to_string().contains("rrf_k"));
    }

    #[test]
    fn fuse_and_merge_validates_config_zero_final_top_k() {
        let config = RetrievalConfig {
            final_top_k: 0,
            ..Default::default()
        };
        let result = fuse_and_merge(vec![("a", channel(&[1]))], vec![], &config);
        assert!(result.unwrap_err().to_string().contains("final_top_k"));
    }

    #[test]
    fn fuse_and_merge_truncates() {
        let config = RetrievalConfig {
            final_top_k: 2,
            ..Default::default()
        };
        let results =
            fuse_and_merge(vec![("a", channel(&[1, 2, 3, 4]))], vec![], &config).expect("valid");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].book_id, Some(1));
    }

    #[test]
    fn fuse_and_merge_sets_final_scores() {
        let results = fuse_and_merge(
            vec![("a", channel(&[1, 2]))],
            vec![],
            &RetrievalConfig::default(),
        )
        .expect("valid");
        assert!(results.iter().all(|r| r.final_score == r.fused_score));
    }
}
