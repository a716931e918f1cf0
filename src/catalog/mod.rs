pub mod dedup;
pub mod normalize;
pub mod recommend;
pub mod title;

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::error::ValidationError;
use crate::models::{Episode, Media, MediaType, Partition};
use crate::parser::{parse_lenient_records, RawRecord, RawValue};

pub use dedup::deduplicate;
pub use normalize::{derive_id, normalize_fields, normalize_record};
pub use recommend::{recommend, recommend_with, RankingSettings};
pub use title::{extract_title_number, normalize_title, titles_similar};

/// Insertion-ordered records with an id index
#[derive(Debug, Clone, Default)]
struct Collection {
    items: Vec<Media>,
    index: HashMap<String, usize>,
}

impl Collection {
    fn get(&self, id: &str) -> Option<&Media> {
        self.index.get(id).map(|&pos| &self.items[pos])
    }

    /// Replaces in place, so an updated record keeps its position
    fn upsert(&mut self, media: Media) -> Option<Media> {
        match self.index.get(&media.id) {
            Some(&pos) => Some(std::mem::replace(&mut self.items[pos], media)),
            None => {
                self.index.insert(media.id.clone(), self.items.len());
                self.items.push(media);
                None
            }
        }
    }

    fn remove(&mut self, id: &str) -> Option<Media> {
        let pos = self.index.remove(id)?;
        let removed = self.items.remove(pos);
        for (offset, media) in self.items[pos..].iter().enumerate() {
            self.index.insert(media.id.clone(), pos + offset);
        }
        Some(removed)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub partition: Option<Partition>,
    pub media_type: Option<MediaType>,
    pub year: Option<String>,
    /// Case-insensitive substring of the category string
    pub category: Option<String>,
    pub trending: Option<bool>,
    pub is_new: Option<bool>,
}

impl ListFilter {
    fn matches(&self, media: &Media) -> bool {
        if self.media_type.is_some_and(|t| t != media.media_type) {
            return false;
        }
        if self.year.as_deref().is_some_and(|y| y != media.year) {
            return false;
        }
        if let Some(category) = &self.category {
            let wanted = category.to_lowercase();
            let found = media
                .category
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(&wanted));
            if !found {
                return false;
            }
        }
        if self.trending.is_some_and(|t| t != media.is_trending) {
            return false;
        }
        if self.is_new.is_some_and(|n| n != media.is_new) {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearCount {
    pub year: String,
    pub count: usize,
}

#[derive(Debug, Clone)]
pub enum ImportSource {
    /// Raw text, possibly malformed, run through the lenient parser
    Text(String),
    /// Already structured values; each needs a title and a type
    Records(Vec<RawValue>),
}

#[derive(Debug, Clone, Copy)]
pub struct ImportOptions {
    /// Skip new ids whose normalized title is already cataloged
    pub dedupe_against_catalog: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            dedupe_against_catalog: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub duplicates: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub count: usize,
    pub errors: Vec<String>,
}

/// The whole catalog, split by partition. The combined view is never stored.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    movies: Collection,
    series: Collection,
    anime: Collection,
    other: Collection,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn collection(&self, partition: Partition) -> &Collection {
        match partition {
            Partition::Movies => &self.movies,
            Partition::Series => &self.series,
            Partition::Anime => &self.anime,
            Partition::Other => &self.other,
        }
    }

    fn collection_mut(&mut self, partition: Partition) -> &mut Collection {
        match partition {
            Partition::Movies => &mut self.movies,
            Partition::Series => &mut self.series,
            Partition::Anime => &mut self.anime,
            Partition::Other => &mut self.other,
        }
    }

    fn locate(&self, id: &str) -> Option<Partition> {
        Partition::ALL
            .into_iter()
            .find(|&p| self.collection(p).index.contains_key(id))
    }

    /// Insert or replace by id. A replacement that changes partition is
    /// removed from the old one, so every id lives in one place.
    pub fn insert(&mut self, media: Media) -> Option<Media> {
        let target = media.partition();
        let moved = match self.locate(&media.id) {
            Some(current) if current != target => self.collection_mut(current).remove(&media.id),
            _ => None,
        };
        self.collection_mut(target).upsert(media).or(moved)
    }

    pub fn get(&self, id: &str) -> Option<&Media> {
        self.locate(id).and_then(|p| self.collection(p).get(id))
    }

    pub fn remove(&mut self, id: &str) -> Option<Media> {
        let partition = self.locate(id)?;
        self.collection_mut(partition).remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.locate(id).is_some()
    }

    pub fn len(&self) -> usize {
        Partition::ALL
            .iter()
            .map(|&p| self.collection(p).items.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn partition(&self, partition: Partition) -> &[Media] {
        &self.collection(partition).items
    }

    /// Combined view: movies, series, anime, other
    pub fn all(&self) -> Vec<&Media> {
        Partition::ALL
            .iter()
            .flat_map(|&p| self.collection(p).items.iter())
            .collect()
    }

    pub fn list(&self, filter: &ListFilter) -> Vec<&Media> {
        let source: Vec<&Media> = match filter.partition {
            Some(p) => self.collection(p).items.iter().collect(),
            None => self.all(),
        };
        deduplicate(source.into_iter().filter(|m| filter.matches(m)))
    }

    /// Title and English description match case-insensitively, the Arabic
    /// description as given. Numbered titles come first in ascending order.
    pub fn search(&self, query: &str, limit: Option<usize>) -> Vec<&Media> {
        let needle = query.trim().to_lowercase();
        let raw_needle = query.trim();

        let hits = self.all().into_iter().filter(|m| {
            m.title.to_lowercase().contains(&needle)
                || m
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
                || m
                    .description_ar
                    .as_deref()
                    .is_some_and(|d| d.contains(raw_needle))
        });

        let mut results = deduplicate(hits);
        results.sort_by(|a, b| {
            match (extract_title_number(&a.title), extract_title_number(&b.title)) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            }
        });

        // Zero means no limit
        if let Some(limit) = limit.filter(|&n| n > 0) {
            results.truncate(limit);
        }
        results
    }

    /// Distinct years with their record counts, newest first
    pub fn years(&self, media_type: Option<MediaType>) -> Vec<YearCount> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for media in self.all() {
            if media_type.is_some_and(|t| t != media.media_type) {
                continue;
            }
            *counts.entry(media.year.as_str()).or_insert(0) += 1;
        }

        let mut years: Vec<YearCount> = counts
            .into_iter()
            .map(|(year, count)| YearCount {
                year: year.to_string(),
                count,
            })
            .collect();
        years.sort_by(|a, b| b.year.cmp(&a.year));
        years
    }

    pub fn episode(&self, media_id: &str, number: i64) -> Option<(&Media, &Episode)> {
        let media = self.get(media_id)?;
        let episode = media.episode(number)?;
        Some((media, episode))
    }

    pub fn recommendations(&self, id: &str, settings: &RankingSettings) -> Vec<Media> {
        recommend_with(id, &self.all(), settings)
    }

    /// parse -> validate -> normalize -> dedupe -> insert
    pub fn import(&mut self, source: ImportSource, options: ImportOptions) -> ImportReport {
        let mut report = ImportReport::default();

        let normalized: Vec<Media> = match source {
            ImportSource::Text(text) => {
                let parsed = parse_lenient_records(&text);
                report.total = parsed.records.len() + parsed.report.skipped();
                report.failed += parsed.report.skipped();
                report.errors.extend(parsed.report.errors);
                parsed.records.iter().map(normalize_fields).collect()
            }
            ImportSource::Records(values) => {
                report.total = values.len();
                let mut normalized = Vec::with_capacity(values.len());
                for (i, value) in values.iter().enumerate() {
                    match require_fields(value, i + 1, &["title", "type"]) {
                        Ok(record) => normalized.push(normalize_fields(record)),
                        Err(errors) => {
                            report.failed += 1;
                            report
                                .errors
                                .extend(errors.into_iter().map(|e| e.to_string()));
                        }
                    }
                }
                normalized
            }
        };

        let before = normalized.len();
        let unique = deduplicate(normalized);
        report.duplicates += before - unique.len();

        let mut known: HashSet<String> = if options.dedupe_against_catalog {
            self.all().into_iter().map(|m| normalize_title(&m.title)).collect()
        } else {
            HashSet::new()
        };

        for media in unique {
            if options.dedupe_against_catalog {
                let key = normalize_title(&media.title);
                if !self.contains(&media.id) && known.contains(&key) {
                    tracing::debug!("Skipping {} ({}): title already cataloged", media.id, media.title);
                    report.duplicates += 1;
                    continue;
                }
                known.insert(key);
            }
            self.insert(media);
            report.success += 1;
        }

        tracing::info!(
            "Import finished: {} of {} imported, {} failed, {} duplicates",
            report.success,
            report.total,
            report.failed,
            report.duplicates
        );
        report
    }

    /// Pretty-printed JSON array of every stored record, in combined order
    pub fn export(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.all())
    }
}

impl Extend<Media> for Catalog {
    fn extend<I: IntoIterator<Item = Media>>(&mut self, iter: I) {
        for media in iter {
            self.insert(media);
        }
    }
}

impl FromIterator<Media> for Catalog {
    fn from_iter<I: IntoIterator<Item = Media>>(iter: I) -> Self {
        let mut catalog = Catalog::new();
        catalog.extend(iter);
        catalog
    }
}

/// Every listed field must be present as non-empty text. `index` is the
/// 1-based position used in error messages.
pub fn require_fields<'a>(
    value: &'a RawValue,
    index: usize,
    fields: &[&'static str],
) -> Result<&'a RawRecord, Vec<ValidationError>> {
    let Some(record) = value.as_record() else {
        return Err(vec![ValidationError::NotAnObject { index }]);
    };

    let missing: Vec<ValidationError> = fields
        .iter()
        .filter(|&&field| {
            record
                .value(field)
                .and_then(RawValue::as_non_empty_text)
                .is_none()
        })
        .map(|&field| ValidationError::MissingField { index, field })
        .collect();

    if missing.is_empty() {
        Ok(record)
    } else {
        Err(missing)
    }
}

/// Strict check of an import payload: a JSON array (or single object) whose
/// items all carry `id`, `title` and `type`
pub fn validate_records(text: &str) -> ValidationReport {
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            return ValidationReport {
                is_valid: false,
                count: 0,
                errors: vec![ValidationError::InvalidJson(e.to_string()).to_string()],
            }
        }
    };

    let items: Vec<RawValue> = match value {
        serde_json::Value::Array(items) => items.into_iter().map(RawValue::from).collect(),
        other => vec![RawValue::from(other)],
    };

    let errors: Vec<String> = items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| require_fields(item, i + 1, &["id", "title", "type"]).err())
        .flatten()
        .map(|e| e.to_string())
        .collect();

    ValidationReport {
        is_valid: errors.is_empty(),
        count: items.len(),
        errors,
    }
}
