use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteCourse {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub image: Option<RemoteImage>,
}

impl RemoteCourse {
    pub fn image_url(&self) -> Option<String> {
        self.image.as_ref().and_then(|image| image.large.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteImage {
    #[serde(default)]
    pub large: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSubject {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    /// Video summaries are stored as delivered.
    #[serde(default)]
    pub videos: serde_json::Value,
}

/// Body of `/cms/lessons/{subject_id}`.
#[derive(Debug, Deserialize)]
pub struct LessonsEnvelope {
    #[serde(default)]
    pub videos: Option<Vec<RemoteLesson>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteLesson {
    pub id: i64,
    #[serde(default)]
    pub thumb: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub hd_video_url: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub pdfs: Option<RemotePdfs>,
}

/// Older upstream payloads carry a single attachment object instead of a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RemotePdfs {
    Many(Vec<RemotePdf>),
    One(RemotePdf),
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemotePdf {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}
