use super::AssetRecord;
use crate::collation::normalize_search_text;
use crate::metadata::collect_strings;

/// Builds the normalized, space-joined text an asset is searched against.
///
/// Sources: title, description, tag labels, owner name, version labels and
/// every scalar leaf of the asset and version metadata.
pub fn build_haystack(asset: &AssetRecord) -> String {
    let mut parts: Vec<String> = Vec::new();
    parts.push(asset.title.clone());
    if let Some(description) = &asset.description {
        parts.push(description.clone());
    }
    parts.extend(asset.tags.iter().map(|tag| tag.label.clone()));
    if let Some(owner) = &asset.owner {
        parts.push(owner.name.clone());
    }
    for version in &asset.versions {
        parts.push(version.label.clone());
        parts.extend(collect_strings(&version.metadata));
    }
    parts.extend(collect_strings(&asset.metadata));

    parts
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .map(normalize_search_text)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Substring match of the normalized query; a blank query matches everything.
pub fn matches_query(asset: &AssetRecord, query: &str) -> bool {
    let needle = normalize_search_text(query.trim());
    if needle.is_empty() {
        return true;
    }
    build_haystack(asset).contains(&needle)
}
