//! Trait definitions for the external collaborators the retriever drives.
//!
//! Channel backends (vector or BM25 search), exact-match lookups and
//! rerankers live outside this crate. Each implements one of the traits
//! here so the retriever can fan out to them uniformly.

use crate::error::FusionError;
use crate::types::CandidateRecord;

/// A ranked retrieval backend.
///
/// Implementors run one query against a vector or lexical index and
/// return records ordered by channel-native relevance, best first.
/// The retriever re-stamps `rank_in_channel` from list position, so
/// implementors need not set it.
///
/// All implementations must be `Send + Sync` for concurrent sub-queries.
pub trait ChannelSearch: Send + Sync {
    /// Run `query` and return at most `top_k` records.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError`] if the backend is unreachable or its
    /// response cannot be decoded.
    fn search(
        &self,
        query: &str,
        top_k: usize,
    ) -> impl std::future::Future<Output = Result<Vec<CandidateRecord>, FusionError>> + Send;
}

/// A literal lookup (ISBN, call number, exact title) outside the ranked index.
pub trait ExactMatchLookup: Send + Sync {
    /// Look up records matching `key` exactly.
    ///
    /// Returned records should carry `exact_match_score`; the retriever
    /// fills in `1.0` when it is missing.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError`] if the lookup backend fails.
    fn lookup(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Vec<CandidateRecord>, FusionError>> + Send;

    /// Whether this lookup should run at all.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// An optional second-stage reranker (e.g. a cross-encoder).
pub trait Reranker: Send + Sync {
    /// Reorder `records` for `query`. May rescore but must not invent records.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::Rerank`] if the model call fails.
    fn rerank(
        &self,
        query: &str,
        records: Vec<CandidateRecord>,
    ) -> impl std::future::Future<Output = Result<Vec<CandidateRecord>, FusionError>> + Send;

    /// Whether this reranker should run at all.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Exact-match lookup that is never consulted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExactMatch;

impl ExactMatchLookup for NoExactMatch {
    async fn lookup(&self, _key: &str) -> Result<Vec<CandidateRecord>, FusionError> {
        Ok(Vec::new())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Reranker that is never consulted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReranker;

impl Reranker for NoReranker {
    async fn rerank(
        &self,
        _query: &str,
        records: Vec<CandidateRecord>,
    ) -> Result<Vec<CandidateRecord>, FusionError> {
        Ok(records)
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A mock channel for testing trait bounds and async execution.
    struct MockChannel {
        results: Vec<CandidateRecord>,
    }

    impl MockChannel {
        fn new(results: Vec<CandidateRecord>) -> Self {
            Self { results }
        }

        fn failing() -> Self {
            Self { results: vec![] }
        }
    }

    impl ChannelSearch for MockChannel {
        async fn search(
            &self,
            _query: &str,
            top_k: usize,
        ) -> Result<Vec<CandidateRecord>, FusionError> {
            if self.results.is_empty() {
                return Err(FusionError::Channel("mock channel failure".into()));
            }
            Ok(self.results.iter().take(top_k).cloned().collect())
        }
    }

    #[test]
    fn mock_channel_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MockChannel>();
    }

    #[tokio::test]
    async fn mock_channel_respects_top_k() {
        let channel = MockChannel::new(vec![
            CandidateRecord::new(1),
            CandidateRecord::new(2),
            CandidateRecord::new(3),
        ]);
        let results = channel.search("history", 2).await.expect("should succeed");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].book_id, Some(1));
    }

    #[tokio::test]
    async fn mock_channel_propagates_errors() {
        let result = MockChannel::failing().search("history", 5).await;
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("mock channel failure"));
    }

    #[tokio::test]
    async fn no_exact_match_is_disabled_and_empty() {
        assert!(!NoExactMatch.is_enabled());
        let hits = NoExactMatch.lookup("TP18").await.expect("never fails");
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn no_reranker_is_identity() {
        assert!(!NoReranker.is_enabled());
        let records = vec![CandidateRecord::new(2), CandidateRecord::new(1)];
        let out = NoReranker.rerank("q", records.clone()).await.expect("never fails");
        assert_eq!(out, records);
    }
}
