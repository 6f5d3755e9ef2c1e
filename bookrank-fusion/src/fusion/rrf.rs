//! Reciprocal Rank Fusion across independently-ranked channels.
//!
//! Every record contributes `1 / (k + rank)` for each channel it appears
//! in, where `rank` is its 1-based position in that channel. Contributions
//! are summed per `book_id`, so books that several channels agree on rise
//! to the top. Only rank positions are used; channel-native scores are
//! carried through untouched.
//!
//! Formula: `fused_score(b) = Σ 1 / (k + rank_c(b))`

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::validate_rrf_k;
use crate::error::FusionError;
use crate::types::CandidateRecord;

use super::identity::RecordKey;
use super::recency::is_newer;

/// Default RRF smoothing constant.
pub const DEFAULT_RRF_K: u32 = 60;

/// Reciprocal Rank Fusion engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RrfFusion {
    k: u32,
}

impl Default for RrfFusion {
    fn default() -> Self {
        Self { k: DEFAULT_RRF_K }
    }
}

/// Counters from one fusion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionStats {
    /// Non-empty channels folded in.
    pub channels: usize,
    /// Records across those channels, dropped ones included.
    pub input: usize,
    /// Records dropped for lacking a `book_id`.
    pub dropped: usize,
    /// Distinct `book_id`s in the fused output.
    pub distinct: usize,
}

/// Number of records in `records` that fusion can key, i.e. that carry a
/// `book_id`.
pub fn fusable_count(records: &[CandidateRecord]) -> usize {
    records.iter().filter(|r| r.book_id.is_some()).count()
}

/// Accumulator for one identity while channels are folded in.
struct FusedGroup {
    representative: CandidateRecord,
    score: f64,
}

impl RrfFusion {
    /// Create a fusion engine with the given smoothing constant.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::Config`] if `k` is zero.
    pub fn new(k: u32) -> Result<Self, FusionError> {
        validate_rrf_k(k)?;
        Ok(Self { k })
    }

    /// The smoothing constant in use.
    pub fn k(&self) -> u32 {
        self.k
    }

    /// Contribution of a record at 1-based position `rank`.
    pub fn contribution(&self, rank: usize) -> f64 {
        1.0 / (f64::from(self.k) + rank as f64)
    }

    /// Fuse ranked channels into one list with one record per `book_id`.
    ///
    /// # Pipeline
    ///
    /// 1. Each record at position `r` (1-based) adds `1 / (k + r)` to its
    ///    `book_id`'s total
    /// 2. When a `book_id` is seen again, [`is_newer`] decides which
    ///    snapshot represents it; its metadata is kept
    /// 3. The representative's `fused_score` is the accumulated total
    /// 4. Output is sorted by `fused_score` descending; ties keep first
    ///    encounter order
    ///
    /// Empty channels are skipped. Records without a `book_id` are dropped
    /// with a warning but still occupy their position in the channel.
    pub fn fuse<I, S>(&self, channels: I) -> Vec<CandidateRecord>
    where
        I: IntoIterator<Item = (S, Vec<CandidateRecord>)>,
        S: AsRef<str>,
    {
        self.fuse_with_stats(channels).0
    }

    /// Same as [`Self::fuse`], also returning the run's [`FusionStats`].
    pub fn fuse_with_stats<I, S>(&self, channels: I) -> (Vec<CandidateRecord>, FusionStats)
    where
        I: IntoIterator<Item = (S, Vec<CandidateRecord>)>,
        S: AsRef<str>,
    {
        let mut groups: Vec<FusedGroup> = Vec::new();
        let mut slots: HashMap<RecordKey, usize> = HashMap::new();
        let mut stats = FusionStats::default();

        for (name, records) in channels {
            let name = name.as_ref();
            if records.is_empty() {
                tracing::debug!(channel = name, "skipping empty channel");
                continue;
            }
            stats.channels += 1;
            stats.input += records.len();

            for (position, record) in records.into_iter().enumerate() {
                let rank = position + 1;
                let Some(key) = RecordKey::book_id(&record) else {
                    tracing::warn!(
                        channel = name,
                        rank,
                        title = %record.title,
                        "dropping candidate without book_id"
                    );
                    stats.dropped += 1;
                    continue;
                };
                let contribution = self.contribution(rank);

                match slots.get(&key) {
                    Some(&slot) => {
                        let group = &mut groups[slot];
                        group.score += contribution;
                        if is_newer(&record, &group.representative) {
                            group.representative = record;
                        }
                    }
                    None => {
                        slots.insert(key, groups.len());
                        groups.push(FusedGroup {
                            representative: record,
                            score: contribution,
                        });
                    }
                }
            }
        }

        stats.distinct = groups.len();
        tracing::debug!(
            channels = stats.channels,
            input = stats.input,
            dropped = stats.dropped,
            distinct = stats.distinct,
            k = self.k,
            "rrf fusion complete"
        );

        let mut fused: Vec<CandidateRecord> = groups
            .into_iter()
            .map(|group| {
                let mut record = group.representative;
                record.fused_score = Some(group.score);
                record
            })
            .collect();

        // `sort_by` is stable, so equal scores keep encounter order.
        fused.sort_by(|a, b| fused_score(b).total_cmp(&fused_score(a)));
        (fused, stats)
    }
}

fn fused_score(record: &CandidateRecord) -> f64 {
    record.fused_score.unwrap_or(0.0)
}
