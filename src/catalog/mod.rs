pub mod dto;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use self::dto::{LessonsEnvelope, RemoteCourse, RemoteLesson, RemoteSubject};

pub const DEFAULT_BASE_URL: &str = "https://api.khanglobalstudies.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("upstream rejected the access token")]
    Unauthorized,

    #[error("upstream request failed: {0}")]
    Transport(String),

    #[error("unexpected upstream payload: {0}")]
    Format(String),
}

#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn fetch_courses(&self, token: &str) -> Result<Vec<RemoteCourse>, RemoteError>;
    async fn fetch_course_subjects(
        &self,
        course_id: i64,
        token: &str,
    ) -> Result<Vec<RemoteSubject>, RemoteError>;
    async fn fetch_subject_lessons(
        &self,
        subject_id: i64,
        token: &str,
    ) -> Result<Vec<RemoteLesson>, RemoteError>;
}

pub struct CatalogHttpClient {
    client: Client,
    config: CatalogConfig,
}

impl CatalogHttpClient {
    pub fn new(config: CatalogConfig) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RemoteError::Transport(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }

    async fn get_json(&self, path: &str, token: &str) -> Result<serde_json::Value, RemoteError> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);

        let response = self.client
            .get(&url)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .map_err(|e| RemoteError::Transport(format!("GET {} failed: {}", path, e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(RemoteError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Transport(format!("GET {} returned {}: {}", path, status, body)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| RemoteError::Transport(format!("GET {} body read failed: {}", path, e)))?;

        serde_json::from_slice(&body).map_err(|e| {
            tracing::error!("Failed to parse upstream response for {}: {}", path, e);
            RemoteError::Format(format!("GET {} is not JSON: {}", path, e))
        })
    }
}

/// Decodes a body that must be a JSON array.
fn parse_list<T: DeserializeOwned>(value: serde_json::Value, what: &str) -> Result<Vec<T>, RemoteError> {
    if !value.is_array() {
        return Err(RemoteError::Format(format!("expected a list of {}", what)));
    }
    serde_json::from_value(value)
        .map_err(|e| RemoteError::Format(format!("malformed {}: {}", what, e)))
}

fn parse_lessons(value: serde_json::Value) -> Result<Vec<RemoteLesson>, RemoteError> {
    if !value.is_object() {
        return Err(RemoteError::Format("expected a lessons object".to_string()));
    }
    let envelope: LessonsEnvelope = serde_json::from_value(value)
        .map_err(|e| RemoteError::Format(format!("malformed lessons: {}", e)))?;
    Ok(envelope.videos.unwrap_or_default())
}

#[async_trait]
impl CatalogClient for CatalogHttpClient {
    async fn fetch_courses(&self, token: &str) -> Result<Vec<RemoteCourse>, RemoteError> {
        let body = self.get_json("/cms/user/v2/courses", token).await?;
        parse_list(body, "courses")
    }

    async fn fetch_course_subjects(
        &self,
        course_id: i64,
        token: &str,
    ) -> Result<Vec<RemoteSubject>, RemoteError> {
        let path = format!("/cms/user/courses/{}/v2-lessons", course_id);
        let body = self.get_json(&path, token).await?;
        parse_list(body, "subjects")
    }

    async fn fetch_subject_lessons(
        &self,
        subject_id: i64,
        token: &str,
    ) -> Result<Vec<RemoteLesson>, RemoteError> {
        let path = format!("/cms/lessons/{}", subject_id);
        let body = self.get_json(&path, token).await?;
        parse_lessons(body)
    }
}
