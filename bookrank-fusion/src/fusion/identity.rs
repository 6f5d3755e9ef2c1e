//! Dedup identities for candidate records.
//!
//! Fusion collapses on `book_id`; the exact-match merge collapses on the
//! normalised call number. An empty call number is not an identity.

use crate::types::CandidateRecord;

/// The identity a record is deduplicated under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordKey {
    /// Catalog book id (fusion pass).
    BookId(i64),
    /// Trimmed, non-empty call number (merge pass).
    CallNo(String),
}

impl RecordKey {
    /// Primary identity, `None` for a malformed record without a book id.
    pub fn book_id(record: &CandidateRecord) -> Option<Self> {
        record.book_id.map(Self::BookId)
    }

    /// Secondary identity, `None` when the call number is absent or blank.
    pub fn call_no(record: &CandidateRecord) -> Option<Self> {
        record
            .call_no
            .as_deref()
            .and_then(normalize_call_no)
            .map(|c| Self::CallNo(c.to_string()))
    }
}

/// Normalise a call number for comparison.
///
/// Surrounding whitespace is trimmed. Returns `None` when nothing is
/// left, so blank call numbers never compare equal to each other.
///
/// # Examples
///
/// ```
/// use bookrank_fusion::fusion::identity::normalize_call_no;
///
/// assert_eq!(normalize_call_no("  TP18 "), Some("TP18"));
/// assert_eq!(normalize_call_no("   "), None);
/// ```
pub fn normalize_call_no(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_id_key() {
        let record = CandidateRecord::new(12);
        assert_eq!(RecordKey::book_id(&record), Some(RecordKey::BookId(12)));
    }

    #[test]
    fn missing_book_id_has_no_key() {
        let record = CandidateRecord::default();
        assert_eq!(RecordKey::book_id(&record), None);
    }

    #[test]
    fn call_no_is_trimmed() {
        let a = CandidateRecord::new(1).with_call_no("TP18 ");
        let b = CandidateRecord::new(2).with_call_no("\tTP18");
        assert_eq!(RecordKey::call_no(&a), RecordKey::call_no(&b));
        assert_eq!(RecordKey::call_no(&a), Some(RecordKey::CallNo("TP18".into())));
    }

    #[test]
    fn empty_call_no_has_no_key() {
        let empty = CandidateRecord::new(1).with_call_no("");
        let blank = CandidateRecord::new(2).with_call_no("   ");
        let absent = CandidateRecord::new(3);
        assert_eq!(RecordKey::call_no(&empty), None);
        assert_eq!(RecordKey::call_no(&blank), None);
        assert_eq!(RecordKey::call_no(&absent), None);
    }

    #[test]
    fn call_no_comparison_is_case_sensitive() {
        let upper = CandidateRecord::new(1).with_call_no("TP18");
        let lower = CandidateRecord::new(2).with_call_no("tp18");
        assert_ne!(RecordKey::call_no(&upper), RecordKey::call_no(&lower));
    }
}
