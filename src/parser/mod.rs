// Lenient parser for hand-edited and scraped catalog dumps
// Tries the whole text as one JSON array first, then falls back to pulling out
// individual `{...}` fragments and repairing each one on its own.

pub mod repair;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Loosely-typed value as it appeared in the input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum RawValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Array(Vec<RawValue>),
    Object(RawRecord),
}

impl RawValue {
    /// Strings as-is, numbers in their decimal form
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawValue::String(s) => Some(s.clone()),
            RawValue::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Text that is present and not blank
    pub fn as_non_empty_text(&self) -> Option<String> {
        self.as_text().filter(|s| !s.trim().is_empty())
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RawValue::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            RawValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[RawValue]> {
        match self {
            RawValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RawRecord> {
        match self {
            RawValue::Object(record) => Some(record),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }
}

impl From<serde_json::Value> for RawValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RawValue::Null,
            serde_json::Value::Bool(b) => RawValue::Bool(b),
            serde_json::Value::Number(n) => RawValue::Number(n),
            serde_json::Value::String(s) => RawValue::String(s),
            serde_json::Value::Array(items) => {
                RawValue::Array(items.into_iter().map(RawValue::from).collect())
            }
            serde_json::Value::Object(map) => RawValue::Object(RawRecord {
                fields: map.into_iter().map(|(k, v)| (k, RawValue::from(v))).collect(),
            }),
        }
    }
}

impl From<RawValue> for serde_json::Value {
    fn from(value: RawValue) -> Self {
        match value {
            RawValue::Null => serde_json::Value::Null,
            RawValue::Bool(b) => serde_json::Value::Bool(b),
            RawValue::Number(n) => serde_json::Value::Number(n),
            RawValue::String(s) => serde_json::Value::String(s),
            RawValue::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            RawValue::Object(record) => serde_json::Value::Object(
                record.fields.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
        }
    }
}

/// An object pulled out of the input before normalization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: BTreeMap<String, RawValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.fields.get(key)
    }

    /// Value for `key` unless absent or null
    pub fn value(&self, key: &str) -> Option<&RawValue> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Records need a usable id or a non-empty title to be worth keeping
    pub fn has_identity(&self) -> bool {
        let id = self.value("id").and_then(RawValue::as_non_empty_text);
        let title = self.value("title").and_then(RawValue::as_non_empty_text);
        id.is_some() || title.is_some()
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::String(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::String(s)
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        RawValue::Bool(b)
    }
}

impl From<i64> for RawValue {
    fn from(n: i64) -> Self {
        RawValue::Number(n.into())
    }
}

/// What the parser did with the input, for import diagnostics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseReport {
    pub used_fallback: bool,
    /// Fragments found by the fallback scan (0 when the full-text parse worked)
    pub fragments: usize,
    pub failed_fragments: usize,
    /// Values that parsed but were not objects with an id or title
    pub rejected_records: usize,
    pub errors: Vec<String>,
}

impl ParseReport {
    pub fn skipped(&self) -> usize {
        self.failed_fragments + self.rejected_records
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParsedRecords {
    pub records: Vec<RawRecord>,
    pub report: ParseReport,
}

/// Extract every usable record from `text`. Never fails: anything that cannot
/// be repaired is skipped and described in the report.
pub fn parse_lenient_records(text: &str) -> ParsedRecords {
    let mut parsed = ParsedRecords::default();

    let cleaned = repair::clean_document(text);
    match serde_json::from_str::<serde_json::Value>(&cleaned) {
        Ok(value) => {
            let items = match value {
                serde_json::Value::Array(items) => items,
                other => vec![other],
            };
            for (index, item) in items.into_iter().enumerate() {
                accept(&mut parsed, RawValue::from(item), index + 1);
            }
            tracing::debug!(
                "Parsed {} records from full text ({} rejected)",
                parsed.records.len(),
                parsed.report.rejected_records
            );
        }
        Err(e) => {
            tracing::debug!("Full-text parse failed ({}), scanning for object fragments", e);
            parse_fragments(text, &mut parsed);
        }
    }

    parsed
}

fn parse_fragments(text: &str, parsed: &mut ParsedRecords) {
    let fragments = repair::split_fragments(text);
    parsed.report.used_fallback = true;
    parsed.report.fragments = fragments.len();

    for (index, fragment) in fragments.iter().enumerate() {
        let cleaned = repair::clean_fragment(fragment);
        match serde_json::from_str::<serde_json::Value>(&cleaned) {
            Ok(value) => accept(parsed, RawValue::from(value), index + 1),
            Err(e) => {
                tracing::warn!(
                    "Skipping unparseable fragment {}: {} ({})",
                    index + 1,
                    e,
                    preview(fragment)
                );
                parsed.report.failed_fragments += 1;
                parsed
                    .report
                    .errors
                    .push(format!("fragment {}: {}", index + 1, e));
            }
        }
    }

    tracing::debug!(
        "Fragment scan: {} fragments, {} records, {} failed",
        parsed.report.fragments,
        parsed.records.len(),
        parsed.report.failed_fragments
    );
}

fn accept(parsed: &mut ParsedRecords, value: RawValue, position: usize) {
    match value {
        RawValue::Object(record) if record.has_identity() => parsed.records.push(record),
        RawValue::Object(_) => {
            parsed.report.rejected_records += 1;
            parsed
                .report
                .errors
                .push(format!("record {}: missing id and title", position));
        }
        _ => {
            parsed.report.rejected_records += 1;
            parsed
                .report
                .errors
                .push(format!("record {}: not an object", position));
        }
    }
}

fn preview(fragment: &str) -> String {
    let flat = fragment.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > 80 {
        format!("{}...", flat.chars().take(80).collect::<String>())
    } else {
        flat
    }
}
