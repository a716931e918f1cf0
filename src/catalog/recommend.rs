// Related-title ranking for the detail view
//
// Tier 1: same type with a similar title. When any exist they are the whole
//         answer, ordered by sequence number.
// Tier 2: same type with overlapping categories, best rated first.
// Tier 3: anything else of the same type, best rated first, filling up to the cap.

use std::borrow::Borrow;
use std::cmp::Ordering;

use super::title::{extract_title_number, titles_similar};
use crate::models::Media;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingSettings {
    /// Share of significant title words that must match for Tier 1
    pub similarity_threshold: f64,
    /// Combined size limit for Tiers 2 and 3
    pub max_related: usize,
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.6,
            max_related: 100,
        }
    }
}

pub fn recommend<M: Borrow<Media>>(target_id: &str, catalog: &[M]) -> Vec<Media> {
    recommend_with(target_id, catalog, &RankingSettings::default())
}

pub fn recommend_with<M: Borrow<Media>>(
    target_id: &str,
    catalog: &[M],
    settings: &RankingSettings,
) -> Vec<Media> {
    let catalog: Vec<&Media> = catalog.iter().map(<M as Borrow<Media>>::borrow).collect();
    let Some(target) = catalog.iter().copied().find(|m| m.id == target_id) else {
        return Vec::new();
    };

    let candidates: Vec<&Media> = catalog
        .iter()
        .copied()
        .filter(|m| m.id != target.id && m.media_type == target.media_type)
        .collect();

    let mut similar: Vec<&Media> = candidates
        .iter()
        .copied()
        .filter(|m| titles_similar(&target.title, &m.title, settings.similarity_threshold))
        .collect();

    if !similar.is_empty() {
        tracing::debug!("{} similar titles for {}", similar.len(), target.id);
        similar.sort_by(|a, b| by_sequence(a, b));
        return similar.into_iter().cloned().collect();
    }

    let mut related: Vec<&Media> = candidates
        .iter()
        .copied()
        .filter(|m| categories_overlap(target.category.as_deref(), m.category.as_deref()))
        .collect();
    related.sort_by(|a, b| by_rating(a, b));
    related.truncate(settings.max_related);

    if related.len() < settings.max_related {
        let mut rest: Vec<&Media> = candidates
            .iter()
            .copied()
            .filter(|m| !related.iter().any(|r| r.id == m.id))
            .collect();
        rest.sort_by(|a, b| by_rating(a, b));
        rest.truncate(settings.max_related - related.len());
        related.extend(rest);
    }

    related.into_iter().cloned().collect()
}

/// Numbered titles first in ascending order, then by title, then best rated
fn by_sequence(a: &Media, b: &Media) -> Ordering {
    let number = match (extract_title_number(&a.title), extract_title_number(&b.title)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    number
        .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
        .then_with(|| by_rating(a, b))
}

fn by_rating(a: &Media, b: &Media) -> Ordering {
    b.rating_value().total_cmp(&a.rating_value())
}

/// Case-insensitive containment of the whole category strings, or of any
/// non-empty comma-separated tag of one inside the other
fn categories_overlap(a: Option<&str>, b: Option<&str>) -> bool {
    let (Some(a), Some(b)) = (a, b) else {
        return false;
    };
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }

    let tag_in = |tags: &str, other: &str| {
        tags.split(',')
            .map(str::trim)
            .any(|tag| !tag.is_empty() && other.contains(tag))
    };

    a.contains(&b) || b.contains(&a) || tag_in(&a, &b) || tag_in(&b, &a)
}
