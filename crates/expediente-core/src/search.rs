//! Client-side subject search.

use crate::subject::Subject;

/// Maximum number of subjects a search returns.
pub const SEARCH_RESULT_CAP: usize = 20;

/// Subjects whose full name contains `term`, case-insensitively, in their
/// original order and capped at [`SEARCH_RESULT_CAP`].
///
/// A blank term matches everything, so the first 20 subjects come back.
pub fn filter_subjects<'a>(subjects: &'a [Subject], term: &str) -> Vec<&'a Subject> {
  let needle = term.trim().to_lowercase();
  subjects
    .iter()
    .filter(|s| needle.is_empty() || s.full_name().to_lowercase().contains(&needle))
    .take(SEARCH_RESULT_CAP)
    .collect()
}
