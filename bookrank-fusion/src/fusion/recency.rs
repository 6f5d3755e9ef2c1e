//! Recency preference between two records that share an identity.
//!
//! The index can hold stale and fresh snapshots of the same book. When
//! they collide, the most recently embedded snapshot is kept.

use crate::types::CandidateRecord;

/// Returns `true` if `candidate` should replace `existing`.
///
/// 1. Both records carry a non-empty `embedding_date`: the ISO-8601
///    strings are compared lexicographically.
/// 2. Otherwise the row `id` is compared; an absent id is older than
///    any present one.
/// 3. Ties keep `existing`.
pub fn is_newer(candidate: &CandidateRecord, existing: &CandidateRecord) -> bool {
    match (embedding_date(candidate), embedding_date(existing)) {
        (Some(candidate_date), Some(existing_date)) => candidate_date > existing_date,
        _ => candidate.id > existing.id,
    }
}

fn embedding_date(record: &CandidateRecord) -> Option<&str> {
    record
        .embedding_date
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
}
