use super::normalize_value;
use crate::collation::locale_compare;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

pub const TAG_FREQUENCY_KEY: &str = "ss_tag_frequency";

const CANDIDATE_PATHS: &[&str] = &[
    "ss_tag_frequency",
    "extracted.ss_tag_frequency",
    "extracted.ss_metadata.ss_tag_frequency",
    "ss_metadata.ss_tag_frequency",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFrequency {
    pub label: String,
    pub count: i64,
}

/// Histogram for one training-dataset bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFrequencyGroup {
    pub scope: String,
    pub tags: Vec<TagFrequency>,
}

/// Where a histogram may live inside a normalized blob.
enum FrequencySource {
    Path(&'static str),
    KeySuffix(&'static str),
}

impl FrequencySource {
    fn locate<'a>(&self, blob: &'a Value) -> Option<&'a Value> {
        match self {
            FrequencySource::Path(path) => resolve_path(blob, path),
            FrequencySource::KeySuffix(suffix) => find_key_suffix(blob, suffix),
        }
    }
}

fn sources() -> impl Iterator<Item = FrequencySource> {
    CANDIDATE_PATHS
        .iter()
        .copied()
        .map(FrequencySource::Path)
        .chain(std::iter::once(FrequencySource::KeySuffix(
            TAG_FREQUENCY_KEY,
        )))
}

/// Extracts sorted tag-frequency groups, or an empty vec when the blob has
/// no recognizable histogram.
pub fn extract_tag_frequency(blob: &Value) -> Vec<TagFrequencyGroup> {
    let normalized = normalize_value(blob);
    if normalized.is_null() {
        return Vec::new();
    }

    for source in sources() {
        let Some(found) = source.locate(&normalized) else {
            continue;
        };
        let groups = groups_from_value(found);
        if !groups.is_empty() {
            return groups;
        }
    }

    Vec::new()
}

fn resolve_path<'a>(blob: &'a Value, dotted: &str) -> Option<&'a Value> {
    dotted
        .split('.')
        .try_fold(blob, |current, segment| current.as_object()?.get(segment))
}

/// Depth-first, pre-order: earlier keys and elements are preferred.
fn find_key_suffix<'a>(value: &'a Value, suffix: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                if key.ends_with(suffix) {
                    return Some(nested);
                }
                if let Some(found) = find_key_suffix(nested, suffix) {
                    return Some(found);
                }
            }
            None
        }
        Value::Array(items) => items.iter().find_map(|item| find_key_suffix(item, suffix)),
        _ => None,
    }
}

fn groups_from_value(value: &Value) -> Vec<TagFrequencyGroup> {
    match value {
        Value::Object(scopes) => groups_from_scopes(scopes),
        Value::String(text) => match serde_json::from_str::<Value>(text.trim()) {
            Ok(parsed) => match normalize_value(&parsed) {
                Value::Object(scopes) => groups_from_scopes(&scopes),
                _ => Vec::new(),
            },
            Err(error) => {
                log::debug!("Ignoring unparsable tag frequency payload: {}", error);
                Vec::new()
            }
        },
        _ => Vec::new(),
    }
}

fn groups_from_scopes(scopes: &Map<String, Value>) -> Vec<TagFrequencyGroup> {
    let mut groups: Vec<TagFrequencyGroup> = scopes
        .iter()
        .filter_map(|(scope, entries)| {
            let entries = entries.as_object()?;
            let mut tags: Vec<TagFrequency> = entries
                .iter()
                .filter_map(|(label, raw)| {
                    Some(TagFrequency {
                        label: label.clone(),
                        count: parse_count(raw)?,
                    })
                })
                .collect();
            if tags.is_empty() {
                return None;
            }
            sort_tags(&mut tags);
            Some(TagFrequencyGroup {
                scope: scope.clone(),
                tags,
            })
        })
        .collect();

    groups.sort_by(|left, right| locale_compare(&left.scope, &right.scope));
    groups
}

fn sort_tags(tags: &mut [TagFrequency]) {
    tags.sort_by(|left, right| {
        right
            .count
            .cmp(&left.count)
            .then_with(|| locale_compare(&left.label, &right.label))
    });
}

/// Accepts finite numbers and numeric strings (decimal comma tolerated),
/// truncated toward zero.
fn parse_count(raw: &Value) -> Option<i64> {
    let number = match raw {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().replace(',', ".").parse::<f64>().ok()?,
        _ => return None,
    };
    if !number.is_finite() {
        return None;
    }
    Some(number.trunc() as i64)
}

/// Merges every scope into one descending histogram, capped at `limit`.
pub fn top_tags(groups: &[TagFrequencyGroup], limit: usize) -> Vec<TagFrequency> {
    let mut totals: HashMap<&str, i64> = HashMap::new();
    for tag in groups.iter().flat_map(|group| group.tags.iter()) {
        let total = totals.entry(tag.label.as_str()).or_insert(0);
        *total = total.saturating_add(tag.count);
    }

    let mut merged: Vec<TagFrequency> = totals
        .into_iter()
        .map(|(label, count)| TagFrequency {
            label: label.to_string(),
            count,
        })
        .collect();
    sort_tags(&mut merged);
    merged.truncate(limit);
    merged
}
