use crate::catalog::{AssetRecord, AssetVersion, Visibility};
use crate::storage::StorageRef;
use crate::validation::{check_non_negative, require_text, ValidationErrors};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Curator,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserDraft {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: UserRole,
    pub disabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Editable metadata of a model or image asset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gallery {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub cover: StorageRef,
    #[serde(default)]
    pub entries: Vec<GalleryEntry>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryEntry {
    pub id: String,
    pub asset_id: String,
    #[serde(default)]
    pub position: u32,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GalleryDraft {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryEntryDraft {
    pub asset_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Weights of the popularity score used to rank assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingSettings {
    pub download_weight: f64,
    pub like_weight: f64,
    pub comment_weight: f64,
    pub recency_weight: f64,
    /// Hours after which the recency contribution has halved.
    pub recency_half_life_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingTier {
    pub id: String,
    pub label: String,
    pub min_score: f64,
    #[serde(default)]
    pub badge: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSettings {
    #[serde(default)]
    pub enabled: bool,
    pub max_steps: u32,
    pub max_dimension: u32,
    pub max_loras: u32,
    #[serde(default)]
    pub default_negative_prompt: Option<String>,
}

/// Entry of the generator's base-model catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseModel {
    pub id: String,
    pub name: String,
    /// Model family, e.g. `sd15`, `sdxl`, `ponyxl`.
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub storage: StorageRef,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoraSelection {
    pub lora_id: String,
    pub strength: f32,
}

/// Job record written to the generator queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorRequestPayload {
    pub base_model_ids: Vec<String>,
    pub prompt: String,
    pub negative_prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    pub guidance_scale: f64,
    pub steps: u32,
    pub width: u32,
    pub height: u32,
    pub loras: Vec<LoraSelection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorRequestStatus {
    Queued,
    Pending,
    Running,
    Completed,
    Failed,
    Declined,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorRequest {
    pub id: String,
    pub status: GeneratorRequestStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Queue counters and gates as seen by the current viewer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSummary {
    #[serde(default)]
    pub pending: u32,
    #[serde(default)]
    pub running: u32,
    #[serde(default)]
    pub queued: u32,
    #[serde(default)]
    pub failed: u32,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub declining: bool,
    #[serde(default)]
    pub viewer_blocked: bool,
    #[serde(default)]
    pub viewer_block_reason: Option<String>,
}

fn check_optional_text(errors: &mut ValidationErrors, field: &str, value: Option<&str>) {
    if let Some(value) = value {
        errors.check(field, require_text(value));
    }
}

impl UserDraft {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("username", require_text(&self.username));
        check_optional_text(&mut errors, "display_name", self.display_name.as_deref());
        if let Some(email) = self.email.as_deref() {
            if !email.trim().contains('@') {
                errors.add("email", "is not an email address");
            }
        }
        check_optional_text(&mut errors, "password", self.password.as_deref());
        errors.into_result(())
    }
}

impl AssetUpdate {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if *self == AssetUpdate::default() {
            errors.add("update", "nothing to change");
        }
        check_optional_text(&mut errors, "title", self.title.as_deref());
        check_optional_text(&mut errors, "owner_id", self.owner_id.as_deref());
        errors.into_result(())
    }
}

impl VersionUpdate {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.label.is_none() && self.metadata.is_none() {
            errors.add("update", "nothing to change");
        }
        check_optional_text(&mut errors, "label", self.label.as_deref());
        errors.into_result(())
    }
}

impl GalleryDraft {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("title", require_text(&self.title));
        errors.into_result(())
    }
}

impl GalleryEntryDraft {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("asset_id", require_text(&self.asset_id));
        errors.into_result(())
    }
}

impl RankingSettings {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("download_weight", check_non_negative(self.download_weight));
        errors.check("like_weight", check_non_negative(self.like_weight));
        errors.check("comment_weight", check_non_negative(self.comment_weight));
        errors.check("recency_weight", check_non_negative(self.recency_weight));
        if let Some(hours) = errors.check(
            "recency_half_life_hours",
            check_non_negative(self.recency_half_life_hours),
        ) {
            if hours == 0.0 {
                errors.add("recency_half_life_hours", "must be greater than zero");
            }
        }
        errors.into_result(())
    }
}

impl RankingTier {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("id", require_text(&self.id));
        errors.check("label", require_text(&self.label));
        if !self.min_score.is_finite() {
            errors.add("min_score", "must be a finite number");
        }
        errors.into_result(())
    }
}

impl GeneratorSettings {
    /// A default negative prompt, when present, must not be blank.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_optional_text(
            &mut errors,
            "default_negative_prompt",
            self.default_negative_prompt.as_deref(),
        );
        errors.into_result(())
    }
}

/// Model asset list entry; versions are fetched separately.
pub type ModelAsset = AssetRecord;
pub type ModelVersion = AssetVersion;
pub type ImageAsset = AssetRecord;
