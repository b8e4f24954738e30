use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{error, info, warn};

use crate::catalog::dto::RemoteCourse;
use crate::catalog::{CatalogClient, RemoteError};
use crate::db::repository;
use crate::error::{AppError, FROZEN_MESSAGE};
use crate::models::{Course, Lesson, Subject};
use crate::services::cooldown::{self, Clock};
use crate::services::locks::CourseLocks;
use crate::services::lifecycle;

pub const INVALID_TOKEN_MESSAGE: &str =
    "Unauthenticated. Please check your Phone Number / Password or token and try again.";

/// Work handed from a request handler to the background worker once the
/// token has been validated. Both variants carry the course list returned by
/// that validation call. An update walks with whatever token the course holds
/// when the job runs.
#[derive(Debug, Clone)]
pub enum SyncJob {
    FullSync {
        token: String,
        courses: Vec<RemoteCourse>,
    },
    Update {
        course_id: i64,
        courses: Vec<RemoteCourse>,
    },
}

impl SyncJob {
    pub fn describe(&self) -> String {
        match self {
            SyncJob::FullSync { courses, .. } => format!("full sync of {} course(s)", courses.len()),
            SyncJob::Update { course_id, .. } => format!("update of course {}", course_id),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub courses_inserted: usize,
    pub courses_refreshed: usize,
    pub courses_frozen: usize,
    pub courses_failed: usize,
    pub subjects_upserted: usize,
    pub lessons_upserted: usize,
}

/// How a course walk ended.
enum WalkOutcome {
    Completed,
    TokenRejected,
    Aborted,
}

pub struct SyncService {
    db: SqlitePool,
    catalog: Arc<dyn CatalogClient>,
    clock: Arc<dyn Clock>,
    locks: CourseLocks,
}

impl SyncService {
    pub fn new(db: SqlitePool, catalog: Arc<dyn CatalogClient>, clock: Arc<dyn Clock>) -> Self {
        Self {
            db,
            catalog,
            clock,
            locks: CourseLocks::new(),
        }
    }

    /// Validates `token` with a single upstream call. Nothing is written.
    pub async fn begin_full_sync(&self, token: Option<&str>) -> Result<SyncJob, AppError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Validation("Access token is required".to_string()))?;

        let courses = match self.catalog.fetch_courses(token).await {
            Ok(courses) => courses,
            Err(RemoteError::Unauthorized) => {
                warn!("Full sync rejected: upstream refused the supplied token");
                return Err(AppError::Unauthorized(INVALID_TOKEN_MESSAGE.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(SyncJob::FullSync {
            token: token.to_string(),
            courses,
        })
    }

    /// Checks existence, frozen state and cooldown before the single upstream
    /// validation call. A rejected token freezes the course.
    pub async fn begin_update(&self, course_id: i64) -> Result<SyncJob, AppError> {
        let course = repository::find_course_by_id(&self.db, course_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Course {} not found", course_id)))?;

        let Some(token) = course.access_token.clone() else {
            return Err(AppError::Frozen);
        };

        let remaining = cooldown::course_cooldown(&course, self.clock.now());
        if remaining > chrono::TimeDelta::zero() {
            return Err(AppError::RateLimited { remaining });
        }

        let courses = match self.catalog.fetch_courses(&token).await {
            Ok(courses) => courses,
            Err(RemoteError::Unauthorized) => {
                lifecycle::freeze(&self.db, course_id, &token).await?;
                return Err(AppError::Unauthorized(FROZEN_MESSAGE.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(SyncJob::Update { course_id, courses })
    }

    /// Runs a validated job to completion. Failures are logged and counted,
    /// never returned.
    pub async fn run(&self, job: SyncJob) -> SyncReport {
        let mut report = SyncReport::default();
        match job {
            SyncJob::FullSync { token, courses } => {
                self.full_sync(&token, &courses, &mut report).await
            }
            SyncJob::Update { course_id, courses } => {
                self.update(course_id, &courses, &mut report).await
            }
        }
        report
    }

    async fn full_sync(&self, token: &str, courses: &[RemoteCourse], report: &mut SyncReport) {
        info!("Starting full sync of {} course(s)", courses.len());

        for remote in courses {
            let _guard = self.locks.acquire(remote.id).await;

            if let Err(e) = self.store_course(remote, token, report).await {
                error!("Failed to store course {}: {}", remote.id, e);
                report.courses_failed += 1;
                continue;
            }

            match self.walk_course(remote.id, token, report).await {
                WalkOutcome::Completed => {}
                WalkOutcome::Aborted => report.courses_failed += 1,
                WalkOutcome::TokenRejected => {
                    // The same token backs every remaining course in this batch.
                    match lifecycle::revoke_everywhere(&self.db, token).await {
                        Ok(cleared) => report.courses_frozen += cleared as usize,
                        Err(e) => error!("Failed to revoke rejected token: {}", e),
                    }
                    return;
                }
            }
        }

        info!("All courses, subjects, and lessons processed successfully");
    }

    /// Inserts an unseen course, or refreshes metadata and attaches the freshly
    /// validated token to a known one (frozen or not).
    async fn store_course(
        &self,
        remote: &RemoteCourse,
        token: &str,
        report: &mut SyncReport,
    ) -> Result<(), sqlx::Error> {
        let existing = repository::find_course_by_id(&self.db, remote.id).await?;
        let course = Course::from_remote(remote, token, self.clock.now());
        repository::upsert_course(&self.db, &course).await?;

        match existing {
            None => {
                report.courses_inserted += 1;
                info!("Added new course: {} (ID: {})", course.title, course.id);
            }
            Some(previous) => {
                report.courses_refreshed += 1;
                if lifecycle::is_frozen(&previous) {
                    info!("Renewed token for course: {} (ID: {})", course.title, course.id);
                } else {
                    info!("Refreshed course: {} (ID: {})", course.title, course.id);
                }
            }
        }
        Ok(())
    }

    async fn update(&self, course_id: i64, courses: &[RemoteCourse], report: &mut SyncReport) {
        let _guard = self.locks.acquire(course_id).await;

        let Some(remote) = courses.iter().find(|c| c.id == course_id) else {
            warn!("Course {} is no longer listed upstream, skipping update", course_id);
            report.courses_failed += 1;
            return;
        };

        // Another job may have frozen the course or replaced its token since
        // the precheck.
        let token = match repository::find_course_by_id(&self.db, course_id).await {
            Ok(Some(Course {
                access_token: Some(token),
                ..
            })) => token,
            Ok(_) => {
                warn!("Course {} was frozen after the update was accepted, skipping", course_id);
                report.courses_failed += 1;
                return;
            }
            Err(e) => {
                error!("Failed to load course {}: {}", course_id, e);
                report.courses_failed += 1;
                return;
            }
        };

        let title = remote.title.clone().unwrap_or_default();
        let image = remote.image_url();
        if let Err(e) = repository::refresh_course_metadata(
            &self.db,
            course_id,
            &title,
            image.as_deref(),
            self.clock.now(),
        )
        .await
        {
            error!("Failed to refresh course {}: {}", course_id, e);
            report.courses_failed += 1;
            return;
        }
        report.courses_refreshed += 1;

        match self.walk_course(course_id, &token, report).await {
            WalkOutcome::Completed => info!("Successfully updated course {}", course_id),
            WalkOutcome::Aborted => report.courses_failed += 1,
            WalkOutcome::TokenRejected => match lifecycle::freeze(&self.db, course_id, &token).await {
                Ok(true) => report.courses_frozen += 1,
                Ok(false) => {}
                Err(e) => error!("Failed to freeze course {}: {}", course_id, e),
            },
        }
    }

    /// Upserts every subject of the course and every lesson of each subject.
    /// Writes made before a failure stay committed.
    async fn walk_course(&self, course_id: i64, token: &str, report: &mut SyncReport) -> WalkOutcome {
        match self.try_walk_course(course_id, token, report).await {
            Ok(()) => WalkOutcome::Completed,
            Err(AppError::Remote(RemoteError::Unauthorized)) => {
                warn!("Token rejected while syncing course {}, freezing", course_id);
                WalkOutcome::TokenRejected
            }
            Err(e) => {
                error!("Sync of course {} aborted: {}", course_id, e);
                WalkOutcome::Aborted
            }
        }
    }

    async fn try_walk_course(
        &self,
        course_id: i64,
        token: &str,
        report: &mut SyncReport,
    ) -> Result<(), AppError> {
        let subjects = self.catalog.fetch_course_subjects(course_id, token).await?;

        for remote_subject in &subjects {
            let subject = Subject::from_remote(course_id, remote_subject, self.clock.now());
            repository::upsert_subject(&self.db, &subject).await?;
            report.subjects_upserted += 1;
            info!(
                "Processed subject: {} (ID: {}) for course ID: {}",
                subject.name, subject.id, course_id
            );

            let lessons = self
                .catalog
                .fetch_subject_lessons(remote_subject.id, token)
                .await?;

            for remote_lesson in &lessons {
                let lesson = Lesson::from_remote(course_id, subject.id, remote_lesson, self.clock.now());
                repository::upsert_lesson(&self.db, &lesson).await?;
                report.lessons_upserted += 1;
            }
            info!("Processed {} lesson(s) for subject ID: {}", lessons.len(), subject.id);
        }

        Ok(())
    }
}
