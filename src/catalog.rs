use crate::collation::locale_compare;
use crate::storage::StorageRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

mod pagination;
mod search;

pub use pagination::{PagedView, RevealWindow, DEFAULT_BATCH_SIZE, DEFAULT_REVEAL_COOLDOWN};
pub use search::{build_haystack, matches_query};

/// Tag category holding the single "model type" tag of an asset.
pub const MODEL_TYPE_CATEGORY: &str = "model-type";

const MIB: u64 = 1024 * 1024;
const SMALL_LIMIT_BYTES: u64 = 50 * MIB;
const MEDIUM_LIMIT_BYTES: u64 = 200 * MIB;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    #[default]
    Model,
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetOwner {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetTag {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub category: Option<String>,
}

impl AssetTag {
    pub fn is_model_type(&self) -> bool {
        self.category.as_deref() == Some(MODEL_TYPE_CATEGORY)
    }
}

/// One uploaded revision of a model or image asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetVersion {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub file_size_bytes: Option<u64>,
    #[serde(default)]
    pub storage: StorageRef,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Read-only snapshot of a model or image asset as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: String,
    #[serde(default)]
    pub kind: AssetKind,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub owner: Option<AssetOwner>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub tags: Vec<AssetTag>,
    #[serde(default)]
    pub versions: Vec<AssetVersion>,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub file_size_bytes: Option<u64>,
    #[serde(default)]
    pub storage: StorageRef,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl AssetRecord {
    pub fn size_bucket(&self) -> SizeBucket {
        SizeBucket::from_bytes(self.file_size_bytes)
    }

    pub fn model_type_tag(&self) -> Option<&AssetTag> {
        self.tags.iter().find(|tag| tag.is_model_type())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeBucket {
    Small,
    Medium,
    Large,
    Unknown,
}

impl SizeBucket {
    pub fn from_bytes(bytes: Option<u64>) -> Self {
        match bytes {
            None => SizeBucket::Unknown,
            Some(size) if size < SMALL_LIMIT_BYTES => SizeBucket::Small,
            Some(size) if size < MEDIUM_LIMIT_BYTES => SizeBucket::Medium,
            Some(_) => SizeBucket::Large,
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "small" => Some(SizeBucket::Small),
            "medium" => Some(SizeBucket::Medium),
            "large" => Some(SizeBucket::Large),
            "unknown" => Some(SizeBucket::Unknown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "mode", content = "id")]
pub enum OwnerFilter {
    #[default]
    All,
    Owner(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityFilter {
    #[default]
    All,
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Recent,
    Alphabetical,
    SizeDesc,
    SizeAsc,
}

impl SortKey {
    /// Parses UI/CLI labels, defaulting to recency like the gallery views.
    pub fn from_str(sort_by: &str) -> Self {
        match sort_by.trim().to_ascii_lowercase().as_str() {
            "alphabetical" | "name" | "name_asc" | "title" => SortKey::Alphabetical,
            "size_desc" | "largest" => SortKey::SizeDesc,
            "size_asc" | "smallest" => SortKey::SizeAsc,
            _ => SortKey::Recent,
        }
    }
}

/// Active predicates of one browser view.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub owner: OwnerFilter,
    /// Tag ids that must all be present.
    #[serde(default)]
    pub tag_ids: Vec<String>,
    /// Model-type tag id (single select).
    #[serde(default)]
    pub type_tag_id: Option<String>,
    #[serde(default)]
    pub visibility: VisibilityFilter,
    #[serde(default)]
    pub size_bucket: Option<SizeBucket>,
    #[serde(default)]
    pub sort: SortKey,
}

impl FilterState {
    pub fn reset(&mut self) {
        *self = FilterState::default();
    }

    pub fn matches(&self, asset: &AssetRecord) -> bool {
        matches_query(asset, &self.query)
            && self.matches_owner(asset)
            && self.matches_tags(asset)
            && self.matches_type(asset)
            && self.matches_visibility(asset)
            && self.matches_size(asset)
    }

    fn matches_owner(&self, asset: &AssetRecord) -> bool {
        match &self.owner {
            OwnerFilter::All => true,
            OwnerFilter::Owner(owner_id) => asset
                .owner
                .as_ref()
                .is_some_and(|owner| &owner.id == owner_id),
        }
    }

    fn matches_tags(&self, asset: &AssetRecord) -> bool {
        self.tag_ids.iter().all(|wanted| {
            asset
                .tags
                .iter()
                .any(|tag| !tag.is_model_type() && &tag.id == wanted)
        })
    }

    fn matches_type(&self, asset: &AssetRecord) -> bool {
        let Some(type_id) = self.type_tag_id.as_deref() else {
            return true;
        };
        asset
            .model_type_tag()
            .is_some_and(|tag| tag.id == type_id)
    }

    fn matches_visibility(&self, asset: &AssetRecord) -> bool {
        match self.visibility {
            VisibilityFilter::All => true,
            VisibilityFilter::Public => asset.visibility == Visibility::Public,
            VisibilityFilter::Private => asset.visibility == Visibility::Private,
        }
    }

    fn matches_size(&self, asset: &AssetRecord) -> bool {
        self.size_bucket
            .map_or(true, |bucket| asset.size_bucket() == bucket)
    }
}

pub fn filter_assets<'a>(assets: &'a [AssetRecord], filters: &FilterState) -> Vec<&'a AssetRecord> {
    assets.iter().filter(|asset| filters.matches(asset)).collect()
}

/// Stable sort of a filtered selection.
pub fn sort_assets(assets: &mut [&AssetRecord], sort: SortKey) {
    assets.sort_by(|left, right| compare_assets(left, right, sort));
}

fn compare_assets(left: &AssetRecord, right: &AssetRecord, sort: SortKey) -> Ordering {
    match sort {
        // `None < Some`, so reversing puts undated assets last.
        SortKey::Recent => right.updated_at.cmp(&left.updated_at),
        SortKey::Alphabetical => locale_compare(&left.title, &right.title),
        SortKey::SizeDesc => right
            .file_size_bytes
            .unwrap_or(0)
            .cmp(&left.file_size_bytes.unwrap_or(0)),
        SortKey::SizeAsc => match (left.file_size_bytes, right.file_size_bytes) {
            (Some(left_size), Some(right_size)) => left_size.cmp(&right_size),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}

/// Filters then sorts; the full pipeline run on every state change.
pub fn apply_filters<'a>(assets: &'a [AssetRecord], filters: &FilterState) -> Vec<&'a AssetRecord> {
    let started = std::time::Instant::now();
    let mut selected = filter_assets(assets, filters);
    sort_assets(&mut selected, filters.sort);
    log::debug!(
        "Filter pass kept {} of {} assets in {:.1} ms (sort={:?}, tags={}, query_len={})",
        selected.len(),
        assets.len(),
        started.elapsed().as_secs_f64() * 1000.0,
        filters.sort,
        filters.tag_ids.len(),
        filters.query.len()
    );
    selected
}


#[cfg(test)]
mod tests {
    use super::test_support::{asset, at, tag};
    use super::*;

    fn ids(assets: &[&AssetRecord]) -> Vec<String> {
        assets.iter().map(|asset| asset.id.clone()).collect()
    }

    fn sample() -> Vec<AssetRecord> {
        let mut small = asset("small", "Bravo");
        small.file_size_bytes = Some(10 * MIB);
        small.owner = Some(AssetOwner {
            id: "u1".into(),
            name: "Ana".into(),
        });
        small.tags = vec![
            tag("t-style", "style", None),
            tag("t-anime", "anime", None),
            tag("type-lora", "LoRA", Some(MODEL_TYPE_CATEGORY)),
        ];
        small.updated_at = at(3);

        let mut medium = asset("medium", "alpha");
        medium.file_size_bytes = Some(120 * MIB);
        medium.owner = Some(AssetOwner {
            id: "u2".into(),
            name: "Ben".into(),
        });
        medium.tags = vec![
            tag("t-style", "style", None),
            tag("type-ckpt", "Checkpoint", Some(MODEL_TYPE_CATEGORY)),
        ];
        medium.visibility = Visibility::Private;
        medium.updated_at = at(5);

        let mut large = asset("large", "Charlie");
        large.file_size_bytes = Some(900 * MIB);
        large.updated_at = at(1);

        let unknown = asset("unknown", "delta");

        vec![small, medium, large, unknown]
    }

    #[test]
    fn size_bucket_boundaries() {
        assert_eq!(SizeBucket::from_bytes(None), SizeBucket::Unknown);
        assert_eq!(SizeBucket::from_bytes(Some(0)), SizeBucket::Small);
        assert_eq!(SizeBucket::from_bytes(Some(50 * MIB - 1)), SizeBucket::Small);
        assert_eq!(SizeBucket::from_bytes(Some(50 * MIB)), SizeBucket::Medium);
        assert_eq!(SizeBucket::from_bytes(Some(200 * MIB)), SizeBucket::Large);
    }

    #[test]
    fn owner_all_matches_unfiltered() {
        let assets = sample();
        let unfiltered = filter_assets(&assets, &FilterState::default());
        let all = filter_assets(
            &assets,
            &FilterState {
                owner: OwnerFilter::All,
                ..Default::default()
            },
        );
        assert_eq!(ids(&unfiltered), ids(&all));
        assert_eq!(all.len(), assets.len());
    }

    #[test]
    fn owner_filter_selects_single_owner() {
        let assets = sample();
        let filters = FilterState {
            owner: OwnerFilter::Owner("u2".into()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_assets(&assets, &filters)), vec!["medium"]);
    }

    #[test]
    fn tag_filter_requires_every_tag_and_ignores_type_tags() {
        let assets = sample();
        let both = FilterState {
            tag_ids: vec!["t-style".into(), "t-anime".into()],
            ..Default::default()
        };
        assert_eq!(ids(&filter_assets(&assets, &both)), vec!["small"]);

        let type_as_tag = FilterState {
            tag_ids: vec!["type-lora".into()],
            ..Default::default()
        };
        assert!(filter_assets(&assets, &type_as_tag).is_empty());
    }

    #[test]
    fn type_filter_matches_model_type_category() {
        let assets = sample();
        let filters = FilterState {
            type_tag_id: Some("type-ckpt".into()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_assets(&assets, &filters)), vec!["medium"]);
    }

    #[test]
    fn visibility_filter() {
        let assets = sample();
        let filters = FilterState {
            visibility: VisibilityFilter::Private,
            ..Default::default()
        };
        assert_eq!(ids(&filter_assets(&assets, &filters)), vec!["medium"]);
    }

    #[test]
    fn size_bucket_filter_includes_unknown_bucket() {
        let assets = sample();
        for (bucket, expected) in [
            (SizeBucket::Small, "small"),
            (SizeBucket::Medium, "medium"),
            (SizeBucket::Large, "large"),
            (SizeBucket::Unknown, "unknown"),
        ] {
            let filters = FilterState {
                size_bucket: Some(bucket),
                ..Default::default()
            };
            let selected = filter_assets(&assets, &filters);
            assert_eq!(ids(&selected), vec![expected]);
            assert!(selected.iter().all(|asset| asset.size_bucket() == bucket));
        }
    }

    #[test]
    fn predicates_combine_with_and() {
        let assets = sample();
        let filters = FilterState {
            tag_ids: vec!["t-style".into()],
            visibility: VisibilityFilter::Public,
            ..Default::default()
        };
        assert_eq!(ids(&filter_assets(&assets, &filters)), vec!["small"]);
    }

    #[test]
    fn sort_recent_puts_newest_first_and_undated_last() {
        let assets = sample();
        let filters = FilterState {
            sort: SortKey::Recent,
            ..Default::default()
        };
        assert_eq!(
            ids(&apply_filters(&assets, &filters)),
            vec!["medium", "small", "large", "unknown"]
        );
    }

    #[test]
    fn sort_alphabetical_is_case_insensitive() {
        let assets = sample();
        let filters = FilterState {
            sort: SortKey::Alphabetical,
            ..Default::default()
        };
        assert_eq!(
            ids(&apply_filters(&assets, &filters)),
            vec!["medium", "small", "large", "unknown"]
        );
    }

    #[test]
    fn sort_size_desc_treats_missing_as_zero() {
        let assets = sample();
        let filters = FilterState {
            sort: SortKey::SizeDesc,
            ..Default::default()
        };
        assert_eq!(
            ids(&apply_filters(&assets, &filters)),
            vec!["large", "medium", "small", "unknown"]
        );
    }

    #[test]
    fn sort_size_asc_puts_missing_sizes_last() {
        let mut assets = sample();
        let mut zero = asset("zero", "zero");
        zero.file_size_bytes = Some(0);
        assets.insert(0, asset("missing-first", "m"));
        assets.push(zero);
        let filters = FilterState {
            sort: SortKey::SizeAsc,
            ..Default::default()
        };
        let sorted = apply_filters(&assets, &filters);
        let first_missing = sorted
            .iter()
            .position(|asset| asset.file_size_bytes.is_none())
            .unwrap_or(sorted.len());
        assert_eq!(first_missing, 4);
        assert!(sorted[first_missing..]
            .iter()
            .all(|asset| asset.file_size_bytes.is_none()));
        assert_eq!(sorted[0].id, "zero");
    }

    #[test]
    fn sort_key_parsing_defaults_to_recent() {
        assert_eq!(SortKey::from_str("name"), SortKey::Alphabetical);
        assert_eq!(SortKey::from_str("size_asc"), SortKey::SizeAsc);
        assert_eq!(SortKey::from_str("whatever"), SortKey::Recent);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut filters = FilterState {
            query: "cat".into(),
            sort: SortKey::SizeAsc,
            ..Default::default()
        };
        filters.reset();
        assert_eq!(filters, FilterState::default());
    }
}
