//! Core types for candidate records, query packages and retrieval metadata.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::fusion::FusionStats;

/// A single book hit produced by one retrieval channel.
///
/// Metadata fields are opaque to the engine. Only the score fields
/// (`rank_in_channel`, `fused_score`, `final_score`) are written by the
/// fusion and merge stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateRecord {
    /// Catalog row id as currently indexed. Records without one are
    /// dropped by fusion.
    pub book_id: Option<i64>,
    /// Physical shelf / catalog number. Secondary identity.
    pub call_no: Option<String>,
    /// Book title.
    pub title: String,
    /// Author line as stored in the catalog.
    pub author: String,
    /// Reader rating, when the catalog has one.
    pub rating: Option<f64>,
    /// Catalog summary text.
    pub summary: String,
    /// 1-based position inside the channel this record came from.
    pub rank_in_channel: usize,
    /// Cosine similarity reported by a vector channel.
    pub similarity_score: Option<f64>,
    /// BM25 score reported by a lexical channel.
    pub bm25_score: Option<f64>,
    /// Set only on exact-match hits, conventionally `1.0`.
    pub exact_match_score: Option<f64>,
    /// Accumulated reciprocal-rank-fusion score.
    pub fused_score: Option<f64>,
    /// Score after the exact-match merge.
    pub final_score: Option<f64>,
    /// ISO-8601 timestamp of the index snapshot that produced this row.
    pub embedding_date: Option<String>,
    /// Monotonically increasing row id, used when dates are missing.
    pub id: Option<i64>,
}

impl CandidateRecord {
    /// Create a record for the given catalog book id with empty metadata.
    pub fn new(book_id: i64) -> Self {
        Self {
            book_id: Some(book_id),
            ..Default::default()
        }
    }

    /// Set the call number.
    pub fn with_call_no(mut self, call_no: impl Into<String>) -> Self {
        self.call_no = Some(call_no.into());
        self
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the embedding snapshot date.
    pub fn with_embedding_date(mut self, date: impl Into<String>) -> Self {
        self.embedding_date = Some(date.into());
        self
    }

    /// Set the row id.
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the rating.
    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    /// The score the record is currently ordered by: `final_score` if
    /// merged, else `fused_score`, else `0.0`.
    pub fn ordering_score(&self) -> f64 {
        self.final_score.or(self.fused_score).unwrap_or(0.0)
    }
}

/// One named sub-query produced by query decomposition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubQuery {
    /// Channel name, e.g. `"primary"` or `"tags"`.
    pub name: String,
    /// Text sent to the channel backend.
    pub text: String,
}

impl SubQuery {
    /// Build a sub-query from a name and query text.
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// The decomposed request the retriever executes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryPackage {
    /// Sub-queries, each executed as an independent channel.
    pub sub_queries: Vec<SubQuery>,
    /// Where the package came from (`"user_query"`, `"document"`, ...).
    pub origin: String,
    /// Skip the exact-match channel for this request.
    pub disable_exact_match: bool,
    /// Key for the exact-match lookup. Defaults to the first sub-query text.
    pub exact_match_key: Option<String>,
}

impl QueryPackage {
    /// The key to pass to the exact-match lookup, if any.
    pub fn exact_match_lookup_key(&self) -> Option<&str> {
        self.exact_match_key
            .as_deref()
            .or_else(|| self.sub_queries.first().map(|q| q.text.as_str()))
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// How a single channel fared during a retrieval request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelReport {
    /// Channel (sub-query) name.
    pub name: String,
    /// Records the channel contributed. For sub-query channels only records
    /// carrying a `book_id` count, since fusion drops the rest; every
    /// exact-match hit counts.
    pub count: usize,
    /// Error message when the channel failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether the channel hit its timeout.
    #[serde(default)]
    pub timed_out: bool,
}

impl ChannelReport {
    /// A channel that returned `count` records.
    pub fn succeeded(name: impl Into<String>, count: usize) -> Self {
        Self {
            name: name.into(),
            count,
            error: None,
            timed_out: false,
        }
    }

    /// A channel that failed and contributed nothing.
    pub fn failed(name: impl Into<String>, error: impl fmt::Display, timed_out: bool) -> Self {
        Self {
            name: name.into(),
            count: 0,
            error: Some(error.to_string()),
            timed_out,
        }
    }

    /// Returns `true` if the channel completed without error.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of a multi-query retrieval.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalOutcome {
    /// Final ranked, deduplicated, truncated records.
    pub results: Vec<CandidateRecord>,
    /// One report per sub-query channel, in package order.
    pub channels: Vec<ChannelReport>,
    /// Report for the exact-match channel, if it ran.
    pub exact_match: Option<ChannelReport>,
    /// Whether the reranker reordered the results.
    pub reranked: bool,
    /// Counters from the RRF pass.
    #[serde(default)]
    pub fusion: FusionStats,
}

/// Verdict returned by the downstream thematic screener for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningVerdict {
    /// Whether the screener kept the book.
    pub is_selected: bool,
    /// Relevance score on a 1–5 scale.
    pub score: u8,
    /// Structured reasoning fields.
    pub evaluation_logic: EvaluationLogic,
    /// Free-text justification.
    pub reason: String,
}

impl ScreeningVerdict {
    /// Returns `true` if `score` lies on the 1–5 scale.
    pub fn has_valid_score(&self) -> bool {
        (1..=5).contains(&self.score)
    }
}

/// Reasoning breakdown attached to a [`ScreeningVerdict`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationLogic {
    /// Whether the book addresses the topic at all.
    pub relevance_check: String,
    /// Which brief dimensions the book matches.
    pub dimension_match: String,
}
