use std::borrow::Borrow;
use std::collections::HashSet;

use super::title::normalize_title;
use crate::models::Media;

/// Keeps the first record for every normalized title, in first-seen order.
/// Later duplicates are dropped as they are, nothing is merged.
pub fn deduplicate<M: Borrow<Media>>(records: impl IntoIterator<Item = M>) -> Vec<M> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| {
            let media: &Media = record.borrow();
            seen.insert(normalize_title(&media.title))
        })
        .collect()
}
