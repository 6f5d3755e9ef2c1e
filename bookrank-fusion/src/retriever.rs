//! Retriever orchestrator: concurrent sub-query fan-out, fusion, exact-match
//! merge, optional rerank, truncation.
//!
//! Channel failures and timeouts never fail a multi-query request; the
//! failing channel contributes nothing and is reported in
//! [`RetrievalOutcome::channels`].

use std::time::Duration;

use crate::channel::{ChannelSearch, ExactMatchLookup, NoExactMatch, NoReranker, Reranker};
use crate::config::{require_positive, RetrievalConfig};
use crate::error::{FusionError, Result};
use crate::fusion::{fusable_count, merge_exact_matches, RrfFusion};
use crate::types::{CandidateRecord, ChannelReport, QueryPackage, RetrievalOutcome};

/// Name used for the exact-match channel in reports and logs.
pub const EXACT_MATCH_CHANNEL: &str = "exact_match";

/// Drives one channel backend plus the optional exact-match lookup and
/// reranker through the fusion pipeline.
#[derive(Debug, Clone)]
pub struct Retriever<C, E = NoExactMatch, R = NoReranker> {
    channel: C,
    exact: E,
    reranker: R,
    config: RetrievalConfig,
    fusion: RrfFusion,
}

impl<C: ChannelSearch> Retriever<C> {
    /// Create a retriever over `channel` with no exact-match lookup and no
    /// reranker.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::Config`] if `config` fails validation.
    pub fn new(channel: C, config: RetrievalConfig) -> Result<Self> {
        config.validate()?;
        let fusion = RrfFusion::new(config.rrf_k)?;
        Ok(Self {
            channel,
            exact: NoExactMatch,
            reranker: NoReranker,
            config,
            fusion,
        })
    }
}

impl<C, E, R> Retriever<C, E, R>
where
    C: ChannelSearch,
    E: ExactMatchLookup,
    R: Reranker,
{
    /// Attach an exact-match lookup.
    pub fn with_exact_match<E2: ExactMatchLookup>(self, exact: E2) -> Retriever<C, E2, R> {
        Retriever {
            channel: self.channel,
            exact,
            reranker: self.reranker,
            config: self.config,
            fusion: self.fusion,
        }
    }

    /// Attach a reranker.
    pub fn with_reranker<R2: Reranker>(self, reranker: R2) -> Retriever<C, E, R2> {
        Retriever {
            channel: self.channel,
            exact: self.exact,
            reranker,
            config: self.config,
            fusion: self.fusion,
        }
    }

    /// The validated configuration.
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Single-channel search.
    ///
    /// Runs `query` once with `top_k`, drops records rated below
    /// `min_rating` (falling back to the configured minimum), and truncates
    /// to `top_k`. Nothing to fuse or deduplicate.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::Config`] if `top_k` is zero, or the channel's
    /// error if the single channel fails or times out.
    pub async fn text_search(
        &self,
        query: &str,
        top_k: usize,
        min_rating: Option<f64>,
    ) -> Result<Vec<CandidateRecord>> {
        require_positive("top_k", top_k)?;
        tracing::trace!(query, top_k, "text search");

        let search = self.channel.search(query, top_k);
        let mut records = tokio::time::timeout(self.channel_timeout(), search)
            .await
            .map_err(|_| {
                FusionError::Timeout(format!(
                    "text search exceeded {}ms",
                    self.config.channel_timeout_ms
                ))
            })??;
        stamp_ranks(&mut records);

        if let Some(min) = min_rating.or(self.config.min_rating) {
            let before = records.len();
            records.retain(|r| r.rating.is_some_and(|rating| rating >= min));
            tracing::debug!(min, removed = before - records.len(), "rating filter applied");
        }

        records.truncate(top_k);
        Ok(records)
    }

    /// Multi-query search using the configured `per_query_top_k` and
    /// `final_top_k`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::multi_query_search_with`].
    pub async fn multi_query_search(&self, package: &QueryPackage) -> Result<RetrievalOutcome> {
        self.multi_query_search_with(package, self.config.per_query_top_k, self.config.final_top_k)
            .await
    }

    /// Multi-query search with explicit result sizes.
    ///
    /// # Pipeline
    ///
    /// 1. Fan out every sub-query concurrently, each bounded by the channel
    ///    timeout, alongside the exact-match lookup
    /// 2. Record a [`ChannelReport`] per channel; failures contribute nothing
    /// 3. Fuse all channels with RRF (dedup on `book_id`)
    /// 4. Merge exact matches (dedup on `call_no`)
    /// 5. Rerank if a reranker is attached; on failure keep the merged order
    /// 6. Truncate to `final_top_k`
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::Config`] if either size is zero. Channel,
    /// lookup and rerank failures are reported, never returned.
    pub async fn multi_query_search_with(
        &self,
        package: &QueryPackage,
        per_query_top_k: usize,
        final_top_k: usize,
    ) -> Result<RetrievalOutcome> {
        require_positive("per_query_top_k", per_query_top_k)?;
        require_positive("final_top_k", final_top_k)?;

        // 1. Fan out sub-queries and the exact lookup together.
        let (channel_outcomes, exact_outcome) = tokio::join!(
            self.run_channels(package, per_query_top_k),
            self.run_exact_match(package)
        );

        // 2. Collect ranked lists and reports.
        let mut channels: Vec<(&str, Vec<CandidateRecord>)> =
            Vec::with_capacity(channel_outcomes.len());
        let mut reports: Vec<ChannelReport> = Vec::with_capacity(channel_outcomes.len());
        for (name, outcome) in channel_outcomes {
            let (records, mut report) = settle(name, outcome, self.config.channel_timeout_ms);
            report.count = fusable_count(&records);
            channels.push((name, records));
            reports.push(report);
        }

        let (exact_records, exact_report) = match exact_outcome {
            Some(outcome) => {
                let (mut records, report) =
                    settle(EXACT_MATCH_CHANNEL, outcome, self.config.channel_timeout_ms);
                for record in &mut records {
                    record.exact_match_score.get_or_insert(1.0);
                }
                (records, Some(report))
            }
            None => (Vec::new(), None),
        };

        // 3. Fuse.
        let (fused, fusion) = self.fusion.fuse_with_stats(channels);

        // 4. Merge.
        let merged = merge_exact_matches(fused, exact_records);

        // 5. Rerank.
        let (mut results, reranked) = self.rerank(package, merged).await;

        // 6. Truncate.
        results.truncate(final_top_k);

        tracing::debug!(
            origin = %package.origin,
            channels = reports.len(),
            failed = reports.iter().filter(|r| !r.is_ok()).count(),
            returned = results.len(),
            reranked,
            "multi-query search complete"
        );

        Ok(RetrievalOutcome {
            results,
            channels: reports,
            exact_match: exact_report,
            reranked,
            fusion,
        })
    }

    fn channel_timeout(&self) -> Duration {
        Duration::from_millis(self.config.channel_timeout_ms)
    }

    async fn run_channels<'a>(
        &self,
        package: &'a QueryPackage,
        per_query_top_k: usize,
    ) -> Vec<(&'a str, ChannelOutcome)> {
        let timeout = self.channel_timeout();
        let futures: Vec<_> = package
            .sub_queries
            .iter()
            .map(|sub| async move {
                tracing::trace!(channel = %sub.name, query = %sub.text, "querying channel");
                let outcome =
                    tokio::time::timeout(timeout, self.channel.search(&sub.text, per_query_top_k))
                        .await;
                let outcome = match outcome {
                    Ok(Ok(mut records)) => {
                        records.truncate(per_query_top_k);
                        ChannelOutcome::Records(records)
                    }
                    Ok(Err(err)) => ChannelOutcome::Failed(err),
                    Err(_) => ChannelOutcome::TimedOut,
                };
                (sub.name.as_str(), outcome)
            })
            .collect();

        futures::future::join_all(futures).await
    }

    async fn run_exact_match(&self, package: &QueryPackage) -> Option<ChannelOutcome> {
        if package.disable_exact_match || !self.exact.is_enabled() {
            return None;
        }
        let Some(key) = package.exact_match_lookup_key() else {
            tracing::debug!("no exact-match key; skipping lookup");
            return None;
        };

        tracing::trace!(key, "exact-match lookup");
        let lookup = tokio::time::timeout(self.channel_timeout(), self.exact.lookup(key));
        let outcome = match lookup.await {
            Ok(Ok(records)) => ChannelOutcome::Records(records),
            Ok(Err(err)) => ChannelOutcome::Failed(err),
            Err(_) => ChannelOutcome::TimedOut,
        };
        Some(outcome)
    }

    async fn rerank(
        &self,
        package: &QueryPackage,
        records: Vec<CandidateRecord>,
    ) -> (Vec<CandidateRecord>, bool) {
        if !self.reranker.is_enabled() || records.is_empty() {
            return (records, false);
        }
        let query = package
            .sub_queries
            .first()
            .map(|q| q.text.as_str())
            .unwrap_or_default();

        match self.reranker.rerank(query, records.clone()).await {
            Ok(reranked) => (reranked, true),
            Err(err) => {
                tracing::warn!(error = %err, "rerank failed; keeping fused order");
                (records, false)
            }
        }
    }
}

/// What a single channel call produced.
#[derive(Debug)]
enum ChannelOutcome {
    Records(Vec<CandidateRecord>),
    Failed(FusionError),
    TimedOut,
}

/// Turn a channel outcome into its ranked list and report, logging failures.
fn settle(
    name: &str,
    outcome: ChannelOutcome,
    timeout_ms: u64,
) -> (Vec<CandidateRecord>, ChannelReport) {
    match outcome {
        ChannelOutcome::Records(mut records) => {
            stamp_ranks(&mut records);
            tracing::debug!(channel = name, count = records.len(), "channel returned results");
            let report = ChannelReport::succeeded(name, records.len());
            (records, report)
        }
        ChannelOutcome::Failed(err) => {
            tracing::warn!(channel = name, error = %err, "channel query failed");
            (Vec::new(), ChannelReport::failed(name, err, false))
        }
        ChannelOutcome::TimedOut => {
            let err = FusionError::Timeout(format!("{name} exceeded {timeout_ms}ms"));
            tracing::warn!(channel = name, error = %err, "channel query timed out");
            (Vec::new(), ChannelReport::failed(name, err, true))
        }
    }
}

/// Overwrite `rank_in_channel` with 1-based list position.
fn stamp_ranks(records: &mut [CandidateRecord]) {
    for (position, record) in records.iter_mut().enumerate() {
        record.rank_in_channel = position + 1;
    }
}
