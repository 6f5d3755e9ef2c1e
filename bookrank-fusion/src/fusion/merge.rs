//! Exact-match merge: folds literal lookup hits into a fused list and
//! deduplicates the combined list on normalised call number.
//!
//! The same physical book can appear under different `book_id`s (stale
//! index snapshots) or come from the exact lookup path, which never
//! touches the vector index. Fusion already collapsed `book_id`
//! duplicates; this pass collapses what is left by `call_no`. Records
//! without a call number are never merged with each other.

use std::collections::HashMap;

use crate::types::CandidateRecord;

use super::identity::RecordKey;
use super::recency::is_newer;

/// Combine a fused score and an exact-match score into a final score.
///
/// Uses `max()`: an exact hit never ranks below its semantic placement,
/// and a weak exact hit does not drag down a strongly-fused result.
/// With only one score present, that score is used; with none, `0.0`.
pub fn combine_scores(fused: Option<f64>, exact: Option<f64>) -> f64 {
    match (fused, exact) {
        (Some(fused), Some(exact)) => fused.max(exact),
        (Some(score), None) | (None, Some(score)) => score,
        (None, None) => 0.0,
    }
}

/// Merge exact-match hits into an already-fused list.
///
/// # Pipeline
///
/// 1. Concatenate `fused` then `exact`
/// 2. Group records by trimmed, non-empty `call_no`; blank call numbers
///    pass through individually
/// 3. Pick each group's representative with [`is_newer`]; it keeps its
///    metadata and absorbs the best `fused_score` and `exact_match_score`
///    seen in the group
/// 4. Set `final_score` with [`combine_scores`]
/// 5. Sort by `final_score` descending; ties keep encounter order
pub fn merge_exact_matches(
    fused: Vec<CandidateRecord>,
    exact: Vec<CandidateRecord>,
) -> Vec<CandidateRecord> {
    let input_count = fused.len() + exact.len();
    let mut merged: Vec<CandidateRecord> = Vec::with_capacity(input_count);
    let mut slots: HashMap<RecordKey, usize> = HashMap::new();

    for record in fused.into_iter().chain(exact) {
        let Some(key) = RecordKey::call_no(&record) else {
            merged.push(record);
            continue;
        };

        match slots.get(&key) {
            Some(&slot) => {
                let existing = &mut merged[slot];
                let fused_score = max_option(existing.fused_score, record.fused_score);
                let exact_score =
                    max_option(existing.exact_match_score, record.exact_match_score);
                if is_newer(&record, existing) {
                    tracing::trace!(?key, "newer snapshot replaces call_no duplicate");
                    *existing = record;
                }
                existing.fused_score = fused_score;
                existing.exact_match_score = exact_score;
            }
            None => {
                slots.insert(key, merged.len());
                merged.push(record);
            }
        }
    }

    for record in &mut merged {
        record.final_score = Some(combine_scores(record.fused_score, record.exact_match_score));
    }

    tracing::debug!(
        input = input_count,
        output = merged.len(),
        collapsed = input_count - merged.len(),
        "exact-match merge complete"
    );

    merged.sort_by(|a, b| b.ordering_score().total_cmp(&a.ordering_score()));
    merged
}

fn max_option(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fused(book_id: i64, call_no: &str, score: f64) -> CandidateRecord {
        let mut record = CandidateRecord::new(book_id)
            .with_call_no(call_no)
            .with_title(format!("Fused {book_id}"));
        record.fused_score = Some(score);
        record
    }

    fn exact(book_id: i64, call_no: &str) -> CandidateRecord {
        let mut record = CandidateRecord::new(book_id)
            .with_call_no(call_no)
            .with_title(format!("Exact {book_id}"));
        record.exact_match_score = Some(1.0);
        record
    }

    #[test]
    fn combine_takes_max_of_both() {
        assert!((combine_scores(Some(0.03), Some(1.0)) - 1.0).abs() < f64::EPSILON);
        assert!((combine_scores(Some(1.5), Some(1.0)) - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn combine_single_score_passes_through() {
        assert!((combine_scores(Some(0.03), None) - 0.03).abs() < f64::EPSILON);
        assert!((combine_scores(None, Some(0.7)) - 0.7).abs() < f64::EPSILON);
        assert!(combine_scores(None, None).abs() < f64::EPSILON);
    }

    #[test]
    fn exact_hit_without_overlap_is_appended_with_its_score() {
        let merged = merge_exact_matches(
            vec![fused(1, "I247.5", 0.032), fused(2, "K825", 0.016)],
            vec![exact(900, "TP18")],
        );

        assert_eq!(merged.len(), 3);
        let hit = merged
            .iter()
            .find(|r| r.call_no.as_deref() == Some("TP18"))
            .expect("exact hit present");
        assert_eq!(hit.final_score, Some(1.0));
        assert_eq!(merged[0].book_id, Some(900));
    }

    #[test]
    fn fused_only_records_keep_fused_score_as_final() {
        let merged = merge_exact_matches(vec![fused(1, "A1", 0.032)], vec![]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].final_score, Some(0.032));
    }

    #[test]
    fn empty_call_numbers_are_never_merged() {
        let merged = merge_exact_matches(
            vec![fused(1, "", 0.03), fused(2, "", 0.02)],
            vec![exact(3, "  ")],
        );
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn identical_records_with_empty_call_no_both_survive() {
        let a = fused(1, "", 0.03);
        let b = a.clone();
        let merged = merge_exact_matches(vec![a, b], vec![]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn call_no_duplicates_collapse_to_newest() {
        let stale = fused(1, "TP18", 0.032).with_embedding_date("2023-01-01T00:00:00");
        let fresh = exact(2, " TP18 ").with_embedding_date("2024-01-01T00:00:00");

        let merged = merge_exact_matches(vec![stale], vec![fresh]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].book_id, Some(2));
        assert_eq!(merged[0].title, "Exact 2");
    }

    #[test]
    fn collapsed_record_carries_both_scores() {
        let semantic = fused(1, "TP18", 0.032).with_id(10);
        let literal = exact(2, "TP18").with_id(5);

        let merged = merge_exact_matches(vec![semantic], vec![literal]);

        assert_eq!(merged.len(), 1);
        let record = &merged[0];
        assert_eq!(record.book_id, Some(1));
        assert_eq!(record.fused_score, Some(0.032));
        assert_eq!(record.exact_match_score, Some(1.0));
        assert_eq!(record.final_score, Some(1.0));
    }

    #[test]
    fn book_id_duplicates_with_distinct_call_numbers_survive() {
        // Same book_id should already be collapsed by fusion; the merge
        // pass only looks at call numbers.
        let merged = merge_exact_matches(vec![fused(1, "A1", 0.03)], vec![exact(1, "B2")]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn output_sorted_by_final_score() {
        let merged = merge_exact_matches(
            vec![fused(1, "A", 0.01), fused(2, "B", 0.03), fused(3, "", 0.02)],
            vec![exact(4, "C")],
        );
        let scores: Vec<f64> = merged.iter().map(CandidateRecord::ordering_score).collect();
        for pair in scores.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
        assert_eq!(merged[0].book_id, Some(4));
        assert_eq!(merged[1].book_id, Some(2));
    }

    #[test]
    fn ties_keep_encounter_order() {
        let merged = merge_exact_matches(
            vec![fused(1, "A", 0.02), fused(2, "B", 0.02)],
            vec![],
        );
        assert_eq!(merged[0].book_id, Some(1));
        assert_eq!(merged[1].book_id, Some(2));
    }

    #[test]
    fn empty_inputs_yield_empty() {
        assert!(merge_exact_matches(vec![], vec![]).is_empty());
    }
}
