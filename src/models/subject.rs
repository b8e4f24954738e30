use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use sqlx::types::Json;

use crate::catalog::dto::RemoteSubject;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: i64,
    pub course_id: i64,
    pub name: String,
    pub videos: Json<serde_json::Value>,
    pub updated_at: DateTime<Utc>,
}

impl Subject {
    pub fn from_remote(course_id: i64, remote: &RemoteSubject, now: DateTime<Utc>) -> Self {
        Self {
            id: remote.id,
            course_id,
            name: remote.name.clone().unwrap_or_default(),
            videos: Json(remote.videos.clone()),
            updated_at: now,
        }
    }
}
