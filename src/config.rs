use crate::api::DEFAULT_TIMEOUT_SECONDS;
use crate::catalog::DEFAULT_BATCH_SIZE;
use crate::error::{AdminError, AdminResult};
use crate::storage::StorageConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_STEM: &str = "asset-admin";

/// Bucket that stores base-model checkpoints rather than LoRA files.
pub const DEFAULT_BASE_MODEL_BUCKET: &str = "base-models";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub api_base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    pub request_timeout_seconds: u64,
    pub storage_proxy_url: String,
    pub base_model_bucket: String,
    pub page_batch_size: usize,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".to_string(),
            api_token: None,
            request_timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            storage_proxy_url: "http://127.0.0.1:8000/storage".to_string(),
            base_model_bucket: DEFAULT_BASE_MODEL_BUCKET.to_string(),
            page_batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl AdminConfig {
    pub fn storage(&self) -> StorageConfig {
        StorageConfig {
            proxy_base_url: self.storage_proxy_url.clone(),
            base_model_bucket: self.base_model_bucket.clone(),
        }
    }
}

/// Finds the config file in `dir`.
///
/// Search order: `.yaml` → `.yml` → `.json`.
pub fn find_config(dir: &Path) -> Option<PathBuf> {
    ["yaml", "yml", "json"]
        .iter()
        .map(|ext| dir.join(format!("{}.{}", CONFIG_STEM, ext)))
        .find(|path| path.exists())
}

/// Loads an explicit config file, or the one found in `dir`, or defaults.
pub fn load_config(explicit: Option<&Path>, dir: &Path) -> AdminResult<AdminConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(AdminError::Config(format!(
                    "Config file {} does not exist",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match find_config(dir) {
            Some(path) => path,
            None => {
                log::info!(
                    "No {} config found in {}; using defaults",
                    CONFIG_STEM,
                    dir.display()
                );
                return Ok(AdminConfig::default());
            }
        },
    };

    let config = read_config_file(&path)?;
    log::info!("Loaded configuration from {}", path.display());
    Ok(config)
}

fn read_config_file(path: &Path) -> AdminResult<AdminConfig> {
    let content = std::fs::read_to_string(path)?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    let config = match ext {
        "json" => serde_json::from_str(&content)?,
        _ => serde_yaml::from_str(&content)?, // yaml/yml
    };
    Ok(config)
}

/// Writes the config as `asset-admin.yaml` in `dir`.
pub fn persist_config(dir: &Path, config: &AdminConfig) -> AdminResult<PathBuf> {
    let path = dir.join(format!("{}.yaml", CONFIG_STEM));
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&path, yaml)?;
    Ok(path)
}
