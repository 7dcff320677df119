use super::normalize_value;
use serde_json::Value;
use std::collections::BTreeSet;

/// Collects every non-empty scalar leaf of a metadata blob as a trimmed
/// string, for use in search haystacks.
pub fn collect_strings(metadata: &Value) -> BTreeSet<String> {
    let mut output = BTreeSet::new();
    collect_leaves(&normalize_value(metadata), &mut output);
    output
}

fn collect_leaves(value: &Value, output: &mut BTreeSet<String>) {
    let text = match value {
        Value::Null => return,
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        Value::Bool(boolean) => boolean.to_string(),
        Value::Array(items) => {
            for item in items {
                collect_leaves(item, output);
            }
            return;
        }
        Value::Object(map) => {
            for nested in map.values() {
                collect_leaves(nested, output);
            }
            return;
        }
    };

    if !text.is_empty() {
        output.insert(text);
    }
}
