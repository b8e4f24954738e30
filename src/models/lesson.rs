use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

use crate::catalog::dto::{RemoteLesson, RemotePdf, RemotePdfs};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonPdf {
    pub title: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Lesson {
    pub id: i64,
    #[serde(rename = "subjectId")]
    pub subject_id: i64,
    #[serde(rename = "courseId")]
    pub course_id: i64,
    pub thumb: Option<String>,
    pub name: Option<String>,
    pub video_url: Option<String>,
    pub hd_video_url: Option<String>,
    pub published_at: Option<String>,
    pub pdfs: Option<Json<Vec<LessonPdf>>>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Lesson {
    pub fn from_remote(
        course_id: i64,
        subject_id: i64,
        remote: &RemoteLesson,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: remote.id,
            subject_id,
            course_id,
            thumb: remote.thumb.clone(),
            name: remote.name.clone(),
            video_url: remote.video_url.clone(),
            hd_video_url: remote.hd_video_url.clone(),
            published_at: remote.published_at.clone(),
            pdfs: normalize_pdfs(remote.pdfs.as_ref()).map(Json),
            updated_at: now,
        }
    }
}

/// Drops attachments with neither title nor url. An empty result is `None`,
/// so the stored column is NULL rather than `[]`.
pub fn normalize_pdfs(raw: Option<&RemotePdfs>) -> Option<Vec<LessonPdf>> {
    let entries: Vec<&RemotePdf> = match raw? {
        RemotePdfs::Many(list) => list.iter().collect(),
        RemotePdfs::One(pdf) => vec![pdf],
    };

    let kept: Vec<LessonPdf> = entries
        .into_iter()
        .filter(|pdf| is_present(&pdf.title) || is_present(&pdf.url))
        .map(|pdf| LessonPdf {
            title: pdf.title.clone(),
            url: pdf.url.clone(),
        })
        .collect();

    if kept.is_empty() { None } else { Some(kept) }
}

fn is_present(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pdfs(value: serde_json::Value) -> RemotePdfs {
        serde_json::from_value(value).expect("pdfs should deserialize")
    }

    #[test]
    fn all_empty_attachments_collapse_to_none() {
        let raw = pdfs(json!([
            { "title": null, "url": null },
            { "title": "", "url": null },
            {}
        ]));
        assert_eq!(normalize_pdfs(Some(&raw)), None);
    }

    #[test]
    fn empty_list_collapses_to_none() {
        assert_eq!(normalize_pdfs(Some(&pdfs(json!([])))), None);
        assert_eq!(normalize_pdfs(None), None);
    }

    #[test]
    fn keeps_entries_with_either_field() {
        let raw = pdfs(json!([
            { "title": "Notes", "url": null },
            { "title": null, "url": null },
            { "title": null, "url": "https://cdn/x.pdf" }
        ]));

        let kept = normalize_pdfs(Some(&raw)).expect("two attachments survive");
        assert_eq!(
            kept,
            vec![
                LessonPdf { title: Some("Notes".to_string()), url: None },
                LessonPdf { title: None, url: Some("https://cdn/x.pdf".to_string()) },
            ]
        );
    }

    #[test]
    fn single_object_is_treated_as_one_entry() {
        let raw = pdfs(json!({ "title": "Sheet", "url": "u" }));
        let kept = normalize_pdfs(Some(&raw)).expect("single attachment survives");
        assert_eq!(kept.len(), 1);

        let raw = pdfs(json!({ "title": null, "url": null }));
        assert_eq!(normalize_pdfs(Some(&raw)), None);
    }

    #[test]
    fn serializes_absent_pdfs_as_null() {
        let lesson = Lesson::from_remote(
            1,
            2,
            &serde_json::from_value(json!({ "id": 3, "name": "Intro", "pdfs": [{}] }))
                .expect("lesson should deserialize"),
            Utc::now(),
        );

        let value = serde_json::to_value(&lesson).expect("lesson should serialize");
        assert!(value["pdfs"].is_null());
        assert_eq!(value["subjectId"], 2);
        assert_eq!(value["courseId"], 1);
    }
}
