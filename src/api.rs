use crate::error::{AdminError, AdminResult, ApiFailure};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Method, StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

pub mod models;

use models::{
    AssetUpdate, BaseModel, Gallery, GalleryDraft, GalleryEntry, GalleryEntryDraft,
    GeneratorRequest, GeneratorRequestPayload, GeneratorSettings, ImageAsset, ModelAsset,
    ModelVersion, QueueSummary, RankingSettings, RankingTier, User, UserDraft, VersionUpdate,
};

const API_PREFIX: &str = "/api";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Collection endpoints answer either with a bare array or `{ "items": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListResponse<T> {
    Bare(Vec<T>),
    Envelope {
        #[serde(default = "Vec::new")]
        items: Vec<T>,
    },
}

impl<T> ListResponse<T> {
    pub(crate) fn into_items(self) -> Vec<T> {
        match self {
            ListResponse::Bare(items) | ListResponse::Envelope { items } => items,
        }
    }
}

#[derive(Clone)]
pub struct AdminApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl AdminApiClient {
    pub fn new(base_url: &str, api_token: Option<&str>, timeout_seconds: u64) -> AdminResult<Self> {
        let normalized = normalize_base_url(base_url);
        if normalized.is_empty() {
            return Err(AdminError::Config("API base URL is empty".to_string()));
        }

        Ok(Self {
            client: build_client(api_token, timeout_seconds)?,
            base_url: normalized,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ────────────────────────── Users ──────────────────────────

    pub async fn list_users(&self) -> AdminResult<Vec<User>> {
        self.list("users").await
    }

    pub async fn create_user(&self, draft: &UserDraft) -> AdminResult<User> {
        self.send(Method::POST, "users", draft).await
    }

    pub async fn update_user(&self, id: &str, draft: &UserDraft) -> AdminResult<User> {
        self.send(Method::PUT, &resource_path(&["users", id]), draft).await
    }

    pub async fn delete_user(&self, id: &str) -> AdminResult<()> {
        self.delete(&resource_path(&["users", id])).await
    }

    // ────────────────────────── Model assets ──────────────────────────

    pub async fn list_models(&self) -> AdminResult<Vec<ModelAsset>> {
        self.list("models").await
    }

    pub async fn get_model(&self, id: &str) -> AdminResult<ModelAsset> {
        self.get(&resource_path(&["models", id])).await
    }

    pub async fn update_model(&self, id: &str, update: &AssetUpdate) -> AdminResult<ModelAsset> {
        self.send(Method::PATCH, &resource_path(&["models", id]), update).await
    }

    pub async fn delete_model(&self, id: &str) -> AdminResult<()> {
        self.delete(&resource_path(&["models", id])).await
    }

    pub async fn list_model_versions(&self, model_id: &str) -> AdminResult<Vec<ModelVersion>> {
        self.list(&resource_path(&["models", model_id, "versions"])).await
    }

    pub async fn update_model_version(
        &self,
        model_id: &str,
        version_id: &str,
        update: &VersionUpdate,
    ) -> AdminResult<ModelVersion> {
        self.send(
            Method::PATCH,
            &resource_path(&["models", model_id, "versions", version_id]),
            update,
        )
        .await
    }

    pub async fn delete_model_version(&self, model_id: &str, version_id: &str) -> AdminResult<()> {
        self.delete(&resource_path(&["models", model_id, "versions", version_id]))
            .await
    }

    // ────────────────────────── Image assets ──────────────────────────

    pub async fn list_images(&self) -> AdminResult<Vec<ImageAsset>> {
        self.list("images").await
    }

    pub async fn update_image(&self, id: &str, update: &AssetUpdate) -> AdminResult<ImageAsset> {
        self.send(Method::PATCH, &resource_path(&["images", id]), update).await
    }

    pub async fn delete_image(&self, id: &str) -> AdminResult<()> {
        self.delete(&resource_path(&["images", id])).await
    }

    // ────────────────────────── Galleries ──────────────────────────

    pub async fn list_galleries(&self) -> AdminResult<Vec<Gallery>> {
        self.list("galleries").await
    }

    pub async fn create_gallery(&self, draft: &GalleryDraft) -> AdminResult<Gallery> {
        self.send(Method::POST, "galleries", draft).await
    }

    pub async fn update_gallery(&self, id: &str, draft: &GalleryDraft) -> AdminResult<Gallery> {
        self.send(Method::PUT, &resource_path(&["galleries", id]), draft).await
    }

    pub async fn delete_gallery(&self, id: &str) -> AdminResult<()> {
        self.delete(&resource_path(&["galleries", id])).await
    }

    pub async fn add_gallery_entry(
        &self,
        gallery_id: &str,
        entry: &GalleryEntryDraft,
    ) -> AdminResult<GalleryEntry> {
        self.send(
            Method::POST,
            &resource_path(&["galleries", gallery_id, "entries"]),
            entry,
        )
        .await
    }

    pub async fn remove_gallery_entry(&self, gallery_id: &str, entry_id: &str) -> AdminResult<()> {
        self.delete(&resource_path(&["galleries", gallery_id, "entries", entry_id]))
            .await
    }

    // ────────────────────────── Ranking ──────────────────────────

    pub async fn get_ranking_settings(&self) -> AdminResult<RankingSettings> {
        self.get("ranking/settings").await
    }

    pub async fn update_ranking_settings(
        &self,
        settings: &RankingSettings,
    ) -> AdminResult<RankingSettings> {
        self.send(Method::PUT, "ranking/settings", settings).await
    }

    pub async fn list_ranking_tiers(&self) -> AdminResult<Vec<RankingTier>> {
        self.list("ranking/tiers").await
    }

    pub async fn update_ranking_tier(&self, tier: &RankingTier) -> AdminResult<RankingTier> {
        self.send(Method::PUT, &resource_path(&["ranking", "tiers", &tier.id]), tier)
            .await
    }

    // ────────────────────────── Generator ──────────────────────────

    pub async fn get_generator_settings(&self) -> AdminResult<GeneratorSettings> {
        self.get("generator/settings").await
    }

    pub async fn update_generator_settings(
        &self,
        settings: &GeneratorSettings,
    ) -> AdminResult<GeneratorSettings> {
        self.send(Method::PUT, "generator/settings", settings).await
    }

    pub async fn list_base_models(&self) -> AdminResult<Vec<BaseModel>> {
        self.list("generator/base-models").await
    }

    pub async fn create_generator_request(
        &self,
        payload: &GeneratorRequestPayload,
    ) -> AdminResult<GeneratorRequest> {
        self.send(Method::POST, "generator/requests", payload).await
    }

    pub async fn list_generator_requests(&self) -> AdminResult<Vec<GeneratorRequest>> {
        self.list("generator/requests").await
    }

    pub async fn get_queue_summary(&self) -> AdminResult<QueueSummary> {
        self.get("generator/queue").await
    }

    // ────────────────────────── Transport ──────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> AdminResult<T> {
        let response = self.execute(Method::GET, path, None::<&()>).await?;
        decode_json(response).await
    }

    async fn list<T: DeserializeOwned>(&self, path: &str) -> AdminResult<Vec<T>> {
        let response = self.execute(Method::GET, path, None::<&()>).await?;
        let body: ListResponse<T> = decode_json(response).await?;
        Ok(body.into_items())
    }

    async fn send<B, T>(&self, method: Method, path: &str, body: &B) -> AdminResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.execute(method, path, Some(body)).await?;
        decode_json(response).await
    }

    async fn delete(&self, path: &str) -> AdminResult<()> {
        self.execute(Method::DELETE, path, None::<&()>).await?;
        Ok(())
    }

    /// Builds the outgoing request without sending it.
    fn prepare<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> AdminResult<reqwest::Request>
    where
        B: Serialize + ?Sized,
    {
        let endpoint = build_api_endpoint(&self.base_url, path);
        let mut request = self.client.request(method, &endpoint);
        if let Some(body) = body {
            request = request.json(body);
        }
        request.build().map_err(|error| AdminError::Transport {
            endpoint,
            message: format_transport_error(&error),
        })
    }

    async fn execute<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> AdminResult<reqwest::Response>
    where
        B: Serialize + ?Sized,
    {
        let request = self.prepare(method.clone(), path, body)?;
        let endpoint = request.url().to_string();
        let started = std::time::Instant::now();

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|error| AdminError::Transport {
                endpoint: endpoint.clone(),
                message: format_transport_error(&error),
            })?;
        let status = response.status();
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        if status.is_success() {
            log::info!(
                "Request {} {} returned {} in {:.1} ms",
                method,
                endpoint,
                status.as_u16(),
                elapsed_ms
            );
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let failure = parse_failure(status, &text);
        log::warn!(
            "Request {} {} failed in {:.1} ms: {}",
            method,
            endpoint,
            elapsed_ms,
            failure
        );
        Err(AdminError::Api(failure))
    }
}

async fn decode_json<T: DeserializeOwned>(response: reqwest::Response) -> AdminResult<T> {
    let url = response.url().to_string();
    let bytes = response
        .bytes()
        .await
        .map_err(|error| AdminError::Transport {
            endpoint: url,
            message: format_transport_error(&error),
        })?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Turns an error body into a displayable failure.
///
/// Accepts `{ "message" | "error" | "detail": text, "details": [...] }`;
/// each detail may be a string or an object with `message`/`msg` and an
/// optional `field`/`loc`.
pub(crate) fn parse_failure(status: StatusCode, body: &str) -> ApiFailure {
    let fallback = || {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    };

    let Ok(value) = serde_json::from_str::<Value>(body) else {
        let trimmed = body.trim();
        return ApiFailure {
            status: status.as_u16(),
            message: if trimmed.is_empty() {
                fallback()
            } else {
                trimmed.to_string()
            },
            details: Vec::new(),
        };
    };

    let message = ["message", "error", "detail"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .unwrap_or_else(fallback);

    let details = ["details", "errors", "detail"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_array))
        .map(|items| items.iter().filter_map(format_detail).collect())
        .unwrap_or_default();

    ApiFailure {
        status: status.as_u16(),
        message,
        details,
    }
}

fn format_detail(detail: &Value) -> Option<String> {
    match detail {
        Value::String(text) => Some(text.trim().to_string()).filter(|text| !text.is_empty()),
        Value::Object(map) => {
            let message = map
                .get("message")
                .or_else(|| map.get("msg"))
                .and_then(Value::as_str)?;
            let field = map.get("field").or_else(|| map.get("loc")).map(|field| match field {
                Value::Array(parts) => parts
                    .iter()
                    .map(crate::metadata::display_scalar)
                    .collect::<Vec<_>>()
                    .join("."),
                other => crate::metadata::display_scalar(other),
            });
            Some(match field {
                Some(field) if !field.is_empty() => format!("{field}: {message}"),
                _ => message.to_string(),
            })
        }
        _ => None,
    }
}

/// Joins path segments, percent-encoding each one so ids cannot add
/// segments or a query.
fn resource_path(segments: &[&str]) -> String {
    segments
        .iter()
        .map(|segment| urlencoding::encode(segment))
        .collect::<Vec<_>>()
        .join("/")
}

fn build_api_endpoint(base_url: &str, path: &str) -> String {
    let normalized = normalize_base_url(base_url);
    let path = path.trim_start_matches('/');
    let path = path
        .strip_prefix(API_PREFIX.trim_start_matches('/'))
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(path);
    format!("{normalized}{API_PREFIX}/{path}")
}

fn normalize_base_url(base_url: &str) -> String {
    let mut normalized = base_url.trim().trim_end_matches('/').to_string();
    while let Some(value) = normalized.strip_suffix(API_PREFIX) {
        normalized = value.trim_end_matches('/').to_string();
    }
    normalized
}

fn format_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        return "request timed out".to_string();
    }
    if error.is_connect() {
        return "connection failed; verify the API server is reachable".to_string();
    }
    if error.is_decode() {
        return format!("response could not be decoded: {}", error);
    }
    error.to_string()
}

fn build_client(api_token: Option<&str>, timeout_seconds: u64) -> AdminResult<reqwest::Client> {
    let mut headers = HeaderMap::new();

    if let Some(token) = api_token {
        let token = token.trim();
        if !token.is_empty() {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| AdminError::Config("API token contains invalid characters".into()))?;
            headers.insert(AUTHORIZATION, value);
        }
    }

    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds.max(1)))
        .default_headers(headers)
        .build()
        .map_err(|error| AdminError::Config(format!("Failed to build HTTP client: {}", error)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_base_url_strips_api_suffix() {
        assert_eq!(
            normalize_base_url("https://admin.example.test/api/"),
            "https://admin.example.test"
        );
        assert_eq!(
            normalize_base_url(" https://admin.example.test "),
            "https://admin.example.test"
        );
    }

    #[test]
    fn build_api_endpoint_avoids_duplicate_prefix() {
        assert_eq!(
            build_api_endpoint("https://admin.example.test", "users"),
            "https://admin.example.test/api/users"
        );
        assert_eq!(
            build_api_endpoint("https://admin.example.test/api", "/api/models/7"),
            "https://admin.example.test/api/models/7"
        );
    }

    #[test]
    fn parse_failure_reads_message_and_details() {
        let failure = parse_failure(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"message": "Validation failed", "details": ["title is required", {"field": "steps", "message": "must be positive"}, {"loc": ["body", "width"], "msg": "too large"}]}"#,
        );
        assert_eq!(failure.status, 422);
        assert_eq!(failure.message, "Validation failed");
        assert_eq!(
            failure.details,
            vec![
                "title is required",
                "steps: must be positive",
                "body.width: too large"
            ]
        );
    }

    #[test]
    fn parse_failure_falls_back_to_body_text_or_reason() {
        let plain = parse_failure(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(plain.message, "upstream down");
        assert!(plain.details.is_empty());

        let empty = parse_failure(StatusCode::NOT_FOUND, "");
        assert_eq!(empty.message, "Not Found");

        let error_key = parse_failure(StatusCode::FORBIDDEN, r#"{"error": "forbidden"}"#);
        assert_eq!(error_key.message, "forbidden");
    }

    #[test]
    fn list_response_accepts_bare_and_enveloped_arrays() {
        let bare: ListResponse<u32> = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(bare.into_items(), vec![1, 2]);
        let wrapped: ListResponse<u32> = serde_json::from_str(r#"{"items": [3]}"#).unwrap();
        assert_eq!(wrapped.into_items(), vec![3]);
    }

    #[test]
    fn resource_path_escapes_each_segment() {
        assert_eq!(resource_path(&["users", "a/b"]), "users/a%2Fb");
        assert_eq!(
            resource_path(&["galleries", "g 1", "entries", "e?x#y"]),
            "galleries/g%201/entries/e%3Fx%23y"
        );
        assert_eq!(resource_path(&["models", "m-1_v.2~"]), "models/m-1_v.2~");
    }

    #[test]
    fn prepared_request_carries_method_path_and_json_body() {
        let client = AdminApiClient::new("https://admin.example.test/api/", Some("token"), 5).unwrap();
        let draft = UserDraft {
            username: "ana".into(),
            role: models::UserRole::Curator,
            ..Default::default()
        };

        let request = client
            .prepare(Method::PUT, &resource_path(&["users", "a/b"]), Some(&draft))
            .unwrap();
        assert_eq!(request.method(), Method::PUT);
        assert_eq!(request.url().as_str(), "https://admin.example.test/api/users/a%2Fb");
        assert_eq!(
            request.headers().get(reqwest::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let body: Value =
            serde_json::from_slice(request.body().and_then(|body| body.as_bytes()).unwrap())
                .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"username": "ana", "role": "curator", "disabled": false})
        );

        let delete = client
            .prepare(
                Method::DELETE,
                &resource_path(&["models", "m1", "versions", "v 2"]),
                None::<&()>,
            )
            .unwrap();
        assert_eq!(delete.url().path(), "/api/models/m1/versions/v%202");
        assert!(delete.body().is_none());
    }

    #[test]
    fn client_rejects_empty_base_url() {
        assert!(AdminApiClient::new("  /api ", None, 5).is_err());
        assert!(AdminApiClient::new("https://admin.example.test", Some("token"), 5).is_ok());
    }
}
