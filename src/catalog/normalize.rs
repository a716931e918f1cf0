// Raw record -> canonical Media

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use regex::Regex;
use std::sync::LazyLock;

use crate::models::{Episode, Media, MediaType, Server};
use crate::parser::{RawRecord, RawValue};

pub const UNTITLED: &str = "untitled";
pub const DEFAULT_YEAR: &str = "2024";

static RE_ID_STRIP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").unwrap());
static RE_SPACE_COLLAPSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Stable id for records that arrive without one: "My Show!" -> "my-show"
pub fn derive_id(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = RE_ID_STRIP.replace_all(&lowered, "");
    let id = RE_SPACE_COLLAPSE.replace_all(stripped.trim(), "-").to_string();
    if id.is_empty() {
        UNTITLED.to_string()
    } else {
        id
    }
}

/// Returns `None` only when the value is not an object
pub fn normalize_record(raw: &RawValue) -> Option<Media> {
    raw.as_record().map(normalize_fields)
}

pub fn normalize_fields(record: &RawRecord) -> Media {
    let title = record
        .value("title")
        .and_then(RawValue::as_non_empty_text)
        .map(|t| t.trim().to_string())
        .unwrap_or_else(|| UNTITLED.to_string());

    let id = record
        .value("id")
        .and_then(RawValue::as_non_empty_text)
        .map(|id| id.trim().to_string())
        .unwrap_or_else(|| derive_id(&title));

    let media_type = match record.value("type").and_then(RawValue::as_text) {
        Some(raw_type) => raw_type.parse().unwrap_or_else(|_| {
            tracing::debug!("Unknown media type '{}' on {}, using movie", raw_type, id);
            MediaType::Movie
        }),
        None => MediaType::Movie,
    };

    let mut media = Media::new(id, title, media_type);
    media.description = text(record, "description");
    media.description_ar = text(record, "descriptionAr");
    media.poster = text(record, "poster").unwrap_or_default();
    media.backdrop = text(record, "backdrop");
    media.genre = text(record, "genre");
    media.category = text(record, "category");
    media.year = record
        .value("year")
        .and_then(RawValue::as_non_empty_text)
        .unwrap_or_else(|| DEFAULT_YEAR.to_string());
    media.rating = text(record, "rating");
    media.duration = text(record, "duration");
    media.watch_url = text(record, "watchUrl");
    media.trailer_url = text(record, "trailerUrl");
    media.servers = record
        .value("servers")
        .and_then(RawValue::as_array)
        .map(servers);
    media.episodes = record
        .value("episodes")
        .and_then(RawValue::as_array)
        .map(episodes);
    media.episode_count = record.value("episodeCount").and_then(RawValue::as_i64);
    media.seasons = record.value("seasons").and_then(RawValue::as_i64);
    media.is_new = flag(record, "isNew");
    media.is_trending = flag(record, "isTrending");
    media.is_popular = flag(record, "isPopular");
    media.is_featured = flag(record, "isFeatured");
    if let Some(created_at) = record.value("createdAt").and_then(timestamp) {
        media.created_at = created_at;
    }

    media
}

fn text(record: &RawRecord, key: &str) -> Option<String> {
    record.value(key).and_then(RawValue::as_text)
}

fn flag(record: &RawRecord, key: &str) -> bool {
    match record.value(key) {
        Some(RawValue::Bool(b)) => *b,
        Some(RawValue::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(RawValue::String(s)) => {
            matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes")
        }
        _ => false,
    }
}

fn timestamp(value: &RawValue) -> Option<DateTime<Utc>> {
    match value {
        RawValue::String(s) => {
            let s = s.trim();
            if let Ok(parsed) = DateTime::parse_from_rfc3339(s) {
                return Some(parsed.with_timezone(&Utc));
            }
            let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
            Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
        }
        RawValue::Number(_) => DateTime::from_timestamp_millis(value.as_i64()?),
        _ => None,
    }
}

fn servers(items: &[RawValue]) -> Vec<Server> {
    items
        .iter()
        .filter_map(RawValue::as_record)
        .enumerate()
        .filter_map(|(i, record)| {
            let url = record.value("url").and_then(RawValue::as_non_empty_text)?;
            let name = record
                .value("name")
                .and_then(RawValue::as_non_empty_text)
                .unwrap_or_else(|| format!("Server {}", i + 1));
            Some(Server { name, url })
        })
        .collect()
}

fn episodes(items: &[RawValue]) -> Vec<Episode> {
    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let record = item.as_record()?;
            let number = record
                .value("number")
                .and_then(RawValue::as_i64)
                .unwrap_or(i as i64 + 1);
            let title = record
                .value("title")
                .and_then(RawValue::as_non_empty_text)
                .unwrap_or_else(|| format!("Episode {}", number));
            let servers = record
                .value("servers")
                .and_then(RawValue::as_array)
                .map(servers)
                .unwrap_or_default();
            Some(Episode {
                number,
                title,
                servers,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawValue {
        RawValue::from(value)
    }

    #[test]
    fn test_derive_id() {
        assert_eq!(derive_id("My Show!"), "my-show");
        assert_eq!(derive_id("  Spider-Man:  No Way Home "), "spider-man-no-way-home");
        assert_eq!(derive_id("المؤسس عثمان"), "المؤسس-عثمان");
        assert_eq!(derive_id("!!!"), UNTITLED);
        assert_eq!(derive_id("My Show!"), derive_id("My Show!"));
    }

    #[test]
    fn test_normalize_full_record() {
        let media = normalize_record(&raw(json!({
            "id": 42,
            "title": "Dune",
            "type": "Movie",
            "year": 2021,
            "rating": 8.1,
            "poster": "https://img.example.com/dune.jpg",
            "category": "sci-fi, adventure",
            "isTrending": true,
            "servers": [{"name": "Main", "url": "https://watch.example.com/1"}],
            "createdAt": "2024-03-01T10:00:00Z"
        })))
        .unwrap();

        assert_eq!(media.id, "42");
        assert_eq!(media.title, "Dune");
        assert_eq!(media.media_type, MediaType::Movie);
        assert_eq!(media.year, "2021");
        assert_eq!(media.rating.as_deref(), Some("8.1"));
        assert_eq!(media.category.as_deref(), Some("sci-fi, adventure"));
        assert!(media.is_trending);
        assert!(!media.is_new);
        assert_eq!(media.servers.as_ref().map(Vec::len), Some(1));
        assert_eq!(media.created_at.to_rfc3339(), "2024-03-01T10:00:00+00:00");
    }

    #[test]
    fn test_normalize_defaults() {
        let media = normalize_record(&raw(json!({"title": "My Show!"}))).unwrap();
        assert_eq!(media.id, "my-show");
        assert_eq!(media.media_type, MediaType::Movie);
        assert_eq!(media.year, DEFAULT_YEAR);
        assert_eq!(media.poster, "");
        assert!(media.description.is_none());
        assert!(media.genre.is_none());
        assert!(media.episodes.is_none());

        let media = normalize_record(&raw(json!({"id": "x", "type": "podcast"}))).unwrap();
        assert_eq!(media.title, UNTITLED);
        assert_eq!(media.media_type, MediaType::Movie);
    }

    #[test]
    fn test_normalize_rejects_non_objects() {
        assert!(normalize_record(&raw(json!("just text"))).is_none());
        assert!(normalize_record(&raw(json!([1, 2]))).is_none());
        assert!(normalize_record(&RawValue::Null).is_none());
    }

    #[test]
    fn test_flag_coercion() {
        let media = normalize_record(&raw(json!({
            "title": "Flags",
            "isNew": "yes",
            "isTrending": 1,
            "isPopular": "false",
            "isFeatured": 0
        })))
        .unwrap();
        assert!(media.is_new);
        assert!(media.is_trending);
        assert!(!media.is_popular);
        assert!(!media.is_featured);
    }

    #[test]
    fn test_created_at_formats() {
        let date = normalize_record(&raw(json!({"title": "a", "createdAt": "2023-12-25"}))).unwrap();
        assert_eq!(date.created_at.to_rfc3339(), "2023-12-25T00:00:00+00:00");

        let millis =
            normalize_record(&raw(json!({"title": "a", "createdAt": 1_700_000_000_000i64}))).unwrap();
        assert_eq!(millis.created_at.timestamp(), 1_700_000_000);

        let before = Utc::now();
        let garbage = normalize_record(&raw(json!({"title": "a", "createdAt": "soon"}))).unwrap();
        assert!(garbage.created_at >= before);
    }

    #[test]
    fn test_episode_coercion() {
        let media = normalize_record(&raw(json!({
            "title": "Show",
            "type": "series",
            "episodes": [
                {"number": 1, "title": "Pilot", "servers": [{"url": "https://a"}, {"name": "broken"}]},
                "garbage",
                {"title": "No number"},
                {"number": "4"}
            ]
        })))
        .unwrap();

        let episodes = media.episodes.unwrap();
        assert_eq!(episodes.len(), 3);
        assert_eq!(episodes[0].servers.len(), 1);
        assert_eq!(episodes[0].servers[0].name, "Server 1");
        assert_eq!(episodes[1].number, 3);
        assert_eq!(episodes[2].number, 4);
        assert_eq!(episodes[2].title, "Episode 4");
    }
}
