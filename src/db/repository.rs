use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::{Course, Lesson, Subject};

pub async fn fetch_courses(db: &SqlitePool) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(
        "SELECT id, title, image, access_token, updated_at FROM courses ORDER BY id"
    )
    .fetch_all(db)
    .await
}

pub async fn find_course_by_id(db: &SqlitePool, id: i64) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(
        "SELECT id, title, image, access_token, updated_at FROM courses WHERE id = ?"
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn upsert_course(db: &SqlitePool, course: &Course) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO courses (id, title, image, access_token, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            image = excluded.image,
            access_token = excluded.access_token,
            updated_at = excluded.updated_at
        "#
    )
    .bind(course.id)
    .bind(&course.title)
    .bind(&course.image)
    .bind(&course.access_token)
    .bind(course.updated_at)
    .execute(db)
    .await?;

    Ok(())
}

/// Refreshes title, image and sync timestamp, leaving the token untouched.
pub async fn refresh_course_metadata(
    db: &SqlitePool,
    id: i64,
    title: &str,
    image: Option<&str>,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE courses SET title = ?1, image = ?2, updated_at = ?3 WHERE id = ?4"
    )
    .bind(title)
    .bind(image)
    .bind(now)
    .bind(id)
    .execute(db)
    .await?
    .rows_affected();

    Ok(result > 0)
}

/// Clears the token of one course, but only while it still holds `token`.
pub async fn clear_course_token(db: &SqlitePool, id: i64, token: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE courses SET access_token = NULL WHERE id = ? AND access_token = ?")
        .bind(id)
        .bind(token)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

/// Clears `token` from every course that stores it. Returns the number of
/// courses affected.
pub async fn clear_token_everywhere(db: &SqlitePool, token: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE courses SET access_token = NULL WHERE access_token = ?")
        .bind(token)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result)
}

pub async fn upsert_subject(db: &SqlitePool, subject: &Subject) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO subjects (id, course_id, name, videos, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(id, course_id) DO UPDATE SET
            name = excluded.name,
            videos = excluded.videos,
            updated_at = excluded.updated_at
        "#
    )
    .bind(subject.id)
    .bind(subject.course_id)
    .bind(&subject.name)
    .bind(&subject.videos)
    .bind(subject.updated_at)
    .execute(db)
    .await?;

    Ok(())
}

pub async fn fetch_subjects_by_course(
    db: &SqlitePool,
    course_id: i64,
) -> Result<Vec<Subject>, sqlx::Error> {
    sqlx::query_as::<_, Subject>(
        "SELECT id, course_id, name, videos, updated_at FROM subjects WHERE course_id = ? ORDER BY id"
    )
    .bind(course_id)
    .fetch_all(db)
    .await
}

pub async fn upsert_lesson(db: &SqlitePool, lesson: &Lesson) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO lessons
            (id, subject_id, course_id, thumb, name, video_url, hd_video_url,
            published_at, pdfs, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ON CONFLICT(id, subject_id, course_id) DO UPDATE SET
            thumb = excluded.thumb,
            name = excluded.name,
            video_url = excluded.video_url,
            hd_video_url = excluded.hd_video_url,
            published_at = excluded.published_at,
            pdfs = excluded.pdfs,
            updated_at = excluded.updated_at
        "#
    )
    .bind(lesson.id)
    .bind(lesson.subject_id)
    .bind(lesson.course_id)
    .bind(&lesson.thumb)
    .bind(&lesson.name)
    .bind(&lesson.video_url)
    .bind(&lesson.hd_video_url)
    .bind(&lesson.published_at)
    .bind(&lesson.pdfs)
    .bind(lesson.updated_at)
    .execute(db)
    .await?;

    Ok(())
}

pub async fn fetch_lessons_by_subject(
    db: &SqlitePool,
    subject_id: i64,
) -> Result<Vec<Lesson>, sqlx::Error> {
    sqlx::query_as::<_, Lesson>(
        r#"
        SELECT id, subject_id, course_id, thumb, name, video_url, hd_video_url,
            published_at, pdfs, updated_at
        FROM lessons
        WHERE subject_id = ?
        ORDER BY course_id, id
        "#
    )
    .bind(subject_id)
    .fetch_all(db)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::types::Json;

    use crate::models::LessonPdf;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test db");

        crate::db::MIGRATOR
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        pool
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).unwrap()
    }

    fn course(id: i64, token: Option<&str>) -> Course {
        Course {
            id,
            title: "Algebra".to_string(),
            image: Some("https://cdn/algebra.png".to_string()),
            access_token: token.map(str::to_string),
            updated_at: at(8),
        }
    }

    #[tokio::test]
    async fn test_upsert_and_find_course() {
        let pool = setup_test_db().await;

        upsert_course(&pool, &course(1, Some("T1"))).await.expect("Failed to insert course");
        let mut renamed = course(1, Some("T2"));
        renamed.title = "Algebra II".to_string();
        upsert_course(&pool, &renamed).await.expect("Failed to update course");

        let stored = find_course_by_id(&pool, 1)
            .await
            .expect("Failed to find course")
            .expect("Course not found");
        assert_eq!(stored.title, "Algebra II");
        assert_eq!(stored.access_token.as_deref(), Some("T2"));
        assert_eq!(stored.updated_at, at(8));

        let courses = fetch_courses(&pool).await.expect("Failed to fetch courses");
        assert_eq!(courses.len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_metadata_keeps_token() {
        let pool = setup_test_db().await;
        upsert_course(&pool, &course(4, Some("T"))).await.expect("Failed to insert course");

        let updated = refresh_course_metadata(&pool, 4, "Geometry", None, at(12))
            .await
            .expect("Failed to refresh course");
        assert!(updated);

        let stored = find_course_by_id(&pool, 4).await.unwrap().unwrap();
        assert_eq!(stored.title, "Geometry");
        assert_eq!(stored.image, None);
        assert_eq!(stored.access_token.as_deref(), Some("T"));
        assert_eq!(stored.updated_at, at(12));

        let missing = refresh_course_metadata(&pool, 99, "x", None, at(12)).await.unwrap();
        assert!(!missing);
    }

    #[tokio::test]
    async fn test_clear_tokens() {
        let pool = setup_test_db().await;
        upsert_course(&pool, &course(1, Some("shared"))).await.unwrap();
        upsert_course(&pool, &course(2, Some("shared"))).await.unwrap();
        upsert_course(&pool, &course(3, Some("other"))).await.unwrap();

        assert!(!clear_course_token(&pool, 3, "shared").await.unwrap());
        assert!(clear_course_token(&pool, 3, "other").await.unwrap());
        assert_eq!(clear_token_everywhere(&pool, "shared").await.unwrap(), 2);

        let courses = fetch_courses(&pool).await.unwrap();
        assert!(courses.iter().all(|c| c.access_token.is_none()));
        assert_eq!(courses.len(), 3);
    }

    #[tokio::test]
    async fn test_subject_key_includes_course() {
        let pool = setup_test_db().await;

        for course_id in [1, 2] {
            let subject = Subject {
                id: 10,
                course_id,
                name: format!("Physics {}", course_id),
                videos: Json(json!([{ "id": 1 }])),
                updated_at: at(9),
            };
            upsert_subject(&pool, &subject).await.expect("Failed to upsert subject");
        }

        let again = Subject {
            id: 10,
            course_id: 1,
            name: "Physics renamed".to_string(),
            videos: Json(json!([])),
            updated_at: at(10),
        };
        upsert_subject(&pool, &again).await.expect("Failed to upsert subject");

        let first = fetch_subjects_by_course(&pool, 1).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].name, "Physics renamed");
        assert_eq!(first[0].videos.0, json!([]));

        let second = fetch_subjects_by_course(&pool, 2).await.unwrap();
        assert_eq!(second[0].name, "Physics 2");
        assert!(fetch_subjects_by_course(&pool, 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lesson_upsert_round_trips_pdfs() {
        let pool = setup_test_db().await;

        let mut lesson = Lesson {
            id: 100,
            subject_id: 10,
            course_id: 1,
            thumb: Some("t.png".to_string()),
            name: Some("Vectors".to_string()),
            video_url: Some("sd.m3u8".to_string()),
            hd_video_url: None,
            published_at: Some("2026-02-01T00:00:00Z".to_string()),
            pdfs: Some(Json(vec![LessonPdf {
                title: Some("Notes".to_string()),
                url: None,
            }])),
            updated_at: at(9),
        };
        upsert_lesson(&pool, &lesson).await.expect("Failed to upsert lesson");

        lesson.pdfs = None;
        lesson.name = Some("Vectors (revised)".to_string());
        upsert_lesson(&pool, &lesson).await.expect("Failed to upsert lesson");

        let lessons = fetch_lessons_by_subject(&pool, 10).await.unwrap();
        assert_eq!(lessons.len(), 1);
        assert_eq!(lessons[0].name.as_deref(), Some("Vectors (revised)"));
        assert!(lessons[0].pdfs.is_none());

        let pdfs_is_null: bool = sqlx::query_scalar("SELECT pdfs IS NULL FROM lessons WHERE id = 100")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert!(pdfs_is_null);
    }
}
