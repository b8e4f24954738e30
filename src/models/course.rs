use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::catalog::dto::RemoteCourse;

/// A course ("batch") as stored locally.
///
/// `access_token` is never serialized; it is `None` while the course is frozen.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub image: Option<String>,
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    pub fn from_remote(remote: &RemoteCourse, access_token: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: remote.id,
            title: remote.title.clone().unwrap_or_default(),
            image: remote.image_url(),
            access_token: Some(access_token.to_string()),
            updated_at: now,
        }
    }
}
