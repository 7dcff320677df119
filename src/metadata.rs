use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

mod strings;
mod tag_frequency;

pub use strings::collect_strings;
pub use tag_frequency::{
    extract_tag_frequency, top_tags, TagFrequency, TagFrequencyGroup, TAG_FREQUENCY_KEY,
};

/// Display marker for a present-but-null value.
pub const NULL_MARKER: &str = "–";

/// Wrapper key added by the ingestion pipeline; its children are shown inline.
const EXTRACTED_KEY: &str = "extracted";

/// One display row of a flattened metadata blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRow {
    pub path: String,
    pub value: String,
}

/// Coerces loosely-typed metadata into canonical JSON values.
///
/// Rules:
/// - strings are trimmed
/// - `"true"`/`"True"`, `"false"`/`"False"` and `"null"` become real literals
/// - strings wrapped in `{}` or `[]` are parsed and normalized in turn
/// - arrays and objects are normalized element-wise, keeping key order
pub fn normalize_value(value: &Value) -> Value {
    match value {
        Value::String(text) => normalize_string(text),
        Value::Array(items) => Value::Array(items.iter().map(normalize_value).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, nested)| (key.clone(), normalize_value(nested)))
                .collect(),
        ),
        Value::Null | Value::Bool(_) | Value::Number(_) => value.clone(),
    }
}

fn normalize_string(text: &str) -> Value {
    let trimmed = text.trim();
    match trimmed {
        "true" | "True" => return Value::Bool(true),
        "false" | "False" => return Value::Bool(false),
        "null" => return Value::Null,
        _ => {}
    }

    if looks_like_embedded_json(trimmed) {
        match serde_json::from_str::<Value>(trimmed) {
            Ok(parsed) => return normalize_value(&parsed),
            Err(error) => {
                log::debug!(
                    "Keeping malformed embedded JSON as literal ({} chars): {}",
                    trimmed.len(),
                    error
                );
            }
        }
    }

    Value::String(trimmed.to_string())
}

fn looks_like_embedded_json(text: &str) -> bool {
    (text.starts_with('{') && text.ends_with('}')) || (text.starts_with('[') && text.ends_with(']'))
}

/// Omission predicate that hides the tag-frequency histogram, which is shown
/// in its own table.
pub fn is_tag_frequency_key(key: &str) -> bool {
    key == TAG_FREQUENCY_KEY
}

/// Flattens a metadata blob into ordered `(path, value)` display rows.
///
/// `omit` receives the last key segment of each object entry (index segments
/// never reach it) and drops the whole subtree when it returns `true`.
pub fn flatten_metadata<F>(blob: &Value, omit: F) -> Vec<MetadataRow>
where
    F: Fn(&str) -> bool,
{
    let normalized = normalize_value(blob);
    let mut rows = Vec::new();

    match &normalized {
        Value::Object(map) => {
            for (key, value) in map {
                if omit(key) {
                    continue;
                }
                match value {
                    Value::Object(inner) if key == EXTRACTED_KEY && !inner.is_empty() => {
                        flatten_object_entries(inner, "", &omit, &mut rows);
                    }
                    _ => flatten_into(value, key, &omit, &mut rows),
                }
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_into(item, &format!("[{}]", index), &omit, &mut rows);
            }
        }
        // A bare scalar has no path to display it under.
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
    }

    rows
}

fn flatten_object_entries<F>(
    map: &Map<String, Value>,
    prefix: &str,
    omit: &F,
    rows: &mut Vec<MetadataRow>,
) where
    F: Fn(&str) -> bool,
{
    for (key, value) in map {
        if omit(key) {
            continue;
        }
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        flatten_into(value, &path, omit, rows);
    }
}

fn flatten_into<F>(value: &Value, path: &str, omit: &F, rows: &mut Vec<MetadataRow>)
where
    F: Fn(&str) -> bool,
{
    match value {
        Value::Object(map) if map.is_empty() => push_row(rows, path, "{}".to_string()),
        Value::Object(map) => flatten_object_entries(map, path, omit, rows),
        Value::Array(items) if items.is_empty() => push_row(rows, path, "[]".to_string()),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_into(item, &format!("{}[{}]", path, index), omit, rows);
            }
        }
        Value::Null => push_row(rows, path, NULL_MARKER.to_string()),
        scalar => push_row(rows, path, display_scalar(scalar)),
    }
}

fn push_row(rows: &mut Vec<MetadataRow>, path: &str, value: String) {
    if path.is_empty() {
        return;
    }
    rows.push(MetadataRow {
        path: path.to_string(),
        value,
    });
}

/// Display form of a scalar leaf; containers fall back to compact JSON.
pub(crate) fn display_scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => match number.as_f64() {
            Some(float) if number.is_f64() && float.is_finite() && float.fract() == 0.0 => {
                format!("{:.0}", float)
            }
            _ => number.to_string(),
        },
        Value::Bool(boolean) => boolean.to_string(),
        Value::Null => NULL_MARKER.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paths(rows: &[MetadataRow]) -> Vec<&str> {
        rows.iter().map(|row| row.path.as_str()).collect()
    }

    fn keep_all(_: &str) -> bool {
        false
    }

    #[test]
    fn normalize_coerces_string_literals() {
        let normalized = normalize_value(&json!({
            "a": " True ",
            "b": "false",
            "c": "null",
            "d": "  plain  ",
            "e": 3
        }));
        assert_eq!(
            normalized,
            json!({"a": true, "b": false, "c": null, "d": "plain", "e": 3})
        );
    }

    #[test]
    fn normalize_parses_embedded_json_recursively() {
        let normalized = normalize_value(&json!({
            "ss_metadata": "{\"enabled\": \"True\", \"list\": \"[1, 2]\"}"
        }));
        assert_eq!(
            normalized,
            json!({"ss_metadata": {"enabled": true, "list": [1, 2]}})
        );
    }

    #[test]
    fn normalize_keeps_malformed_json_literal() {
        let normalized = normalize_value(&json!({"broken": "  {invalid}  ", "open": "[1, 2"}));
        assert_eq!(normalized, json!({"broken": "{invalid}", "open": "[1, 2"}));
    }

    #[test]
    fn normalize_does_not_coerce_numeric_strings() {
        assert_eq!(normalize_value(&json!("0042")), json!("0042"));
    }

    #[test]
    fn flatten_nested_objects_and_arrays() {
        let rows = flatten_metadata(&json!({"a": {"b": [1, {"c": null}]}}), keep_all);
        assert_eq!(
            rows,
            vec![
                MetadataRow {
                    path: "a.b[0]".into(),
                    value: "1".into()
                },
                MetadataRow {
                    path: "a.b[1].c".into(),
                    value: NULL_MARKER.into()
                },
            ]
        );
    }

    #[test]
    fn flatten_keeps_empty_containers_visible() {
        let rows = flatten_metadata(&json!({"tags": [], "extra": {}, "name": "x"}), keep_all);
        assert_eq!(paths(&rows), vec!["tags", "extra", "name"]);
        assert_eq!(rows[0].value, "[]");
        assert_eq!(rows[1].value, "{}");
    }

    fn count_leaves(value: &Value) -> usize {
        match value {
            Value::Object(map) if !map.is_empty() => map.values().map(count_leaves).sum(),
            Value::Array(items) if !items.is_empty() => items.iter().map(count_leaves).sum(),
            _ => 1,
        }
    }

    #[test]
    fn flatten_yields_one_row_per_leaf_or_empty_container() {
        let blob = json!({
            "a": 1,
            "b": {"c": [true, null, {}], "d": []},
            "e": "{\"f\": [1, 2]}",
            "g": {"h": " x ", "i": "False"},
            "j": 0.5
        });
        let rows = flatten_metadata(&blob, keep_all);
        assert_eq!(rows.len(), count_leaves(&normalize_value(&blob)));
        assert_eq!(rows.len(), 10);
        assert_eq!(
            paths(&rows),
            vec!["a", "b.c[0]", "b.c[1]", "b.c[2]", "b.d", "e.f[0]", "e.f[1]", "g.h", "g.i", "j"]
        );
    }

    #[test]
    fn integral_floats_display_without_fraction() {
        assert_eq!(display_scalar(&json!(1.0)), "1");
        assert_eq!(display_scalar(&json!(-20.0)), "-20");
        assert_eq!(display_scalar(&json!(0.75)), "0.75");
        assert_eq!(display_scalar(&json!(7)), "7");

        let rows = flatten_metadata(&json!({"ss_learning_rate": 1.0}), keep_all);
        assert_eq!(rows[0].value, "1");
    }

    #[test]
    fn flatten_root_array_uses_bare_indices() {
        let rows = flatten_metadata(&json!([{"label": "cat"}, true]), keep_all);
        assert_eq!(paths(&rows), vec!["[0].label", "[1]"]);
        assert_eq!(rows[1].value, "true");
    }

    #[test]
    fn flatten_empty_top_level_yields_no_rows() {
        assert!(flatten_metadata(&Value::Null, keep_all).is_empty());
        assert!(flatten_metadata(&json!({}), keep_all).is_empty());
        assert!(flatten_metadata(&json!([]), keep_all).is_empty());
        assert!(flatten_metadata(&json!("loose"), keep_all).is_empty());
    }

    #[test]
    fn flatten_inlines_extracted_wrapper() {
        let rows = flatten_metadata(
            &json!({
                "name": "style",
                "extracted": {"ss_base_model": "sdxl", "ss_epoch": "10"},
                "after": 1
            }),
            keep_all,
        );
        assert_eq!(paths(&rows), vec!["name", "ss_base_model", "ss_epoch", "after"]);
    }

    #[test]
    fn flatten_keeps_empty_extracted_as_row() {
        let rows = flatten_metadata(&json!({"extracted": {}}), keep_all);
        assert_eq!(paths(&rows), vec!["extracted"]);
        assert_eq!(rows[0].value, "{}");
    }

    #[test]
    fn flatten_omits_tag_frequency_at_any_depth() {
        let rows = flatten_metadata(
            &json!({
                "ss_tag_frequency": {"set": {"cat": 1}},
                "extracted": {
                    "ss_metadata": {"ss_tag_frequency": {"set": {"dog": 2}}, "ss_seed": 7}
                },
                "list": [{"ss_tag_frequency": {}}]
            }),
            is_tag_frequency_key,
        );
        assert_eq!(paths(&rows), vec!["ss_metadata.ss_seed"]);
    }

    #[test]
    fn flatten_retains_malformed_embedded_json_as_value() {
        let rows = flatten_metadata(&json!({"notes": "{invalid"}), keep_all);
        assert_eq!(rows[0].value, "{invalid");
    }

    #[test]
    fn flatten_expands_stringified_objects() {
        let rows = flatten_metadata(
            &json!({"ss_dataset_dirs": "{\"img\": {\"n_repeats\": 10}}"}),
            keep_all,
        );
        assert_eq!(paths(&rows), vec!["ss_dataset_dirs.img.n_repeats"]);
        assert_eq!(rows[0].value, "10");
    }
}
