//! Rank fusion and deduplication: RRF across channels, then the
//! exact-match merge keyed on call number.
//!
//! Both dedup passes resolve collisions with the same recency rule
//! ([`recency::is_newer`]) so tie-breaking is consistent end to end.

pub mod identity;
pub mod merge;
pub mod recency;
pub mod rrf;

pub use identity::{normalize_call_no, RecordKey};
pub use merge::{combine_scores, merge_exact_matches};
pub use recency::is_newer;
pub use rrf::{fusable_count, FusionStats, RrfFusion};
