#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use catalog_sync::catalog::dto::{RemoteCourse, RemoteLesson, RemoteSubject};
use catalog_sync::catalog::{CatalogClient, RemoteError};
use catalog_sync::services::{Clock, SyncService};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

pub async fn setup_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create database");

    catalog_sync::db::MIGRATOR
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

pub fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap()
}

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn remote_course(value: Value) -> RemoteCourse {
    serde_json::from_value(value).expect("invalid course fixture")
}

pub fn remote_subject(value: Value) -> RemoteSubject {
    serde_json::from_value(value).expect("invalid subject fixture")
}

pub fn remote_lesson(value: Value) -> RemoteLesson {
    serde_json::from_value(value).expect("invalid lesson fixture")
}

/// Scripted upstream. Unknown ids answer with empty lists; tokens in
/// `rejected` answer `Unauthorized` on every call.
#[derive(Default)]
pub struct FakeCatalog {
    courses: Mutex<Vec<RemoteCourse>>,
    subjects: Mutex<HashMap<i64, Result<Vec<RemoteSubject>, RemoteError>>>,
    lessons: Mutex<HashMap<i64, Result<Vec<RemoteLesson>, RemoteError>>>,
    courses_error: Mutex<Option<RemoteError>>,
    rejected: Mutex<HashSet<String>>,
    calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_courses(&self, courses: Vec<RemoteCourse>) {
        *self.courses.lock().unwrap() = courses;
    }

    pub fn fail_courses(&self, error: RemoteError) {
        *self.courses_error.lock().unwrap() = Some(error);
    }

    pub fn set_subjects(&self, course_id: i64, subjects: Vec<RemoteSubject>) {
        self.subjects.lock().unwrap().insert(course_id, Ok(subjects));
    }

    pub fn fail_subjects(&self, course_id: i64, error: RemoteError) {
        self.subjects.lock().unwrap().insert(course_id, Err(error));
    }

    pub fn set_lessons(&self, subject_id: i64, lessons: Vec<RemoteLesson>) {
        self.lessons.lock().unwrap().insert(subject_id, Ok(lessons));
    }

    pub fn fail_lessons(&self, subject_id: i64, error: RemoteError) {
        self.lessons.lock().unwrap().insert(subject_id, Err(error));
    }

    pub fn reject_token(&self, token: &str) {
        self.rejected.lock().unwrap().insert(token.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check_token(&self, token: &str) -> Result<(), RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.rejected.lock().unwrap().contains(token) {
            return Err(RemoteError::Unauthorized);
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogClient for FakeCatalog {
    async fn fetch_courses(&self, token: &str) -> Result<Vec<RemoteCourse>, RemoteError> {
        self.check_token(token)?;
        if let Some(error) = self.courses_error.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(self.courses.lock().unwrap().clone())
    }

    async fn fetch_course_subjects(
        &self,
        course_id: i64,
        token: &str,
    ) -> Result<Vec<RemoteSubject>, RemoteError> {
        self.check_token(token)?;
        self.subjects
            .lock()
            .unwrap()
            .get(&course_id)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn fetch_subject_lessons(
        &self,
        subject_id: i64,
        token: &str,
    ) -> Result<Vec<RemoteLesson>, RemoteError> {
        self.check_token(token)?;
        self.lessons
            .lock()
            .unwrap()
            .get(&subject_id)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

pub fn service(db: &SqlitePool, catalog: &Arc<FakeCatalog>, now: DateTime<Utc>) -> SyncService {
    SyncService::new(db.clone(), catalog.clone(), Arc::new(FixedClock(now)))
}
