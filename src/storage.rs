use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const CACHE_BUST_PARAM: &str = "v";
const CACHE_BUST_TOKEN_LEN: usize = 12;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_key: Option<String>,
}

/// Proxy location and the bucket that holds base-model checkpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub proxy_base_url: String,
    pub base_model_bucket: String,
}

#[derive(Debug, Clone, Copy)]
pub struct CacheBust<'a> {
    pub updated_at: DateTime<Utc>,
    pub entity_id: &'a str,
}

impl CacheBust<'_> {
    pub fn token(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.entity_id.as_bytes());
        hasher.update(b":");
        hasher.update(self.updated_at.timestamp_millis().to_string().as_bytes());
        let digest = hasher.finalize();
        let mut token = String::with_capacity(CACHE_BUST_TOKEN_LEN);
        for byte in digest.iter() {
            if token.len() >= CACHE_BUST_TOKEN_LEN {
                break;
            }
            token.push_str(&format!("{:02x}", byte));
        }
        token.truncate(CACHE_BUST_TOKEN_LEN);
        token
    }
}

/// Builds a fetchable URL for a storage reference, or `None` when it names
/// neither a URL nor a complete bucket/key pair.
pub fn resolve_storage_url(
    config: &StorageConfig,
    reference: &StorageRef,
    cache_bust: Option<CacheBust<'_>>,
) -> Option<String> {
    let base = if let Some(url) = non_empty(reference.url.as_deref()) {
        url.to_string()
    } else {
        let bucket = non_empty(reference.bucket.as_deref())?;
        let key = non_empty(reference.object_key.as_deref())?;
        format!(
            "{}/{}/{}",
            config.proxy_base_url.trim().trim_end_matches('/'),
            urlencoding::encode(bucket),
            key.trim_start_matches('/')
                .split('/')
                .map(urlencoding::encode)
                .collect::<Vec<_>>()
                .join("/")
        )
    };

    Some(match cache_bust {
        Some(bust) => append_query_param(&base, CACHE_BUST_PARAM, &bust.token()),
        None => base,
    })
}

/// Base-model checkpoints live in a dedicated bucket; everything else is
/// treated as a LoRA file.
pub fn is_base_model_ref(config: &StorageConfig, reference: &StorageRef) -> bool {
    reference
        .bucket
        .as_deref()
        .map(str::trim)
        .is_some_and(|bucket| bucket == config.base_model_bucket.trim())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn append_query_param(url: &str, key: &str, value: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{key}={value}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn config() -> StorageConfig {
        StorageConfig {
            proxy_base_url: "https://files.example.test/".into(),
            base_model_bucket: "checkpoints".into(),
        }
    }

    fn bucket_ref(bucket: &str, key: &str) -> StorageRef {
        StorageRef {
            url: None,
            bucket: Some(bucket.into()),
            object_key: Some(key.into()),
        }
    }

    #[test]
    fn direct_url_wins() {
        let reference = StorageRef {
            url: Some("https://cdn.example.test/a.png".into()),
            ..bucket_ref("loras", "ignored")
        };
        assert_eq!(
            resolve_storage_url(&config(), &reference, None).as_deref(),
            Some("https://cdn.example.test/a.png")
        );
    }

    #[test]
    fn bucket_and_key_go_through_proxy() {
        let reference = bucket_ref("loras", "/user 1/style v2.safetensors");
        assert_eq!(
            resolve_storage_url(&config(), &reference, None).as_deref(),
            Some("https://files.example.test/loras/user%201/style%20v2.safetensors")
        );
    }

    #[test]
    fn reserved_characters_in_key_segments_are_escaped() {
        let reference = bucket_ref("lo ras", "a?b/c#d/é.png");
        assert_eq!(
            resolve_storage_url(&config(), &reference, None).as_deref(),
            Some("https://files.example.test/lo%20ras/a%3Fb/c%23d/%C3%A9.png")
        );
    }

    #[test]
    fn incomplete_reference_resolves_to_none() {
        let reference = StorageRef {
            bucket: Some("loras".into()),
            ..Default::default()
        };
        assert!(resolve_storage_url(&config(), &reference, None).is_none());
    }

    #[test]
    fn cache_bust_token_is_stable_and_entity_specific() {
        let updated_at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let first = CacheBust {
            updated_at,
            entity_id: "img-1",
        };
        let second = CacheBust {
            updated_at,
            entity_id: "img-2",
        };
        assert_eq!(first.token(), first.token());
        assert_eq!(first.token().len(), 12);
        assert_ne!(first.token(), second.token());

        let url = resolve_storage_url(
            &config(),
            &StorageRef {
                url: Some("https://cdn.example.test/a.png?w=256".into()),
                ..Default::default()
            },
            Some(first),
        )
        .unwrap();
        assert_eq!(url, format!("https://cdn.example.test/a.png?w=256&v={}", first.token()));
    }

    #[test]
    fn base_model_bucket_detection() {
        assert!(is_base_model_ref(&config(), &bucket_ref("checkpoints", "sdxl.safetensors")));
        assert!(!is_base_model_ref(&config(), &bucket_ref("loras", "style.safetensors")));
        assert!(!is_base_model_ref(&config(), &StorageRef::default()));
    }
}
