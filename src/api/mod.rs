use axum::Json;
use axum::extract::{Path, Query};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::{Deserialize, Serialize};

use crate::db::repository;
use crate::error::AppError;
use crate::models::*;
use crate::state::AppState;

pub const FULL_SYNC_STARTED: &str = "Processing started. Check server logs for completion status.";
pub const UPDATE_STARTED: &str = "Update process started. Check server logs for status.";

#[derive(Deserialize)]
struct StoreCoursesParams {
    token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CoursesResponse {
    pub courses: Vec<Course>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/store-courses", get(store_courses))
        .route("/update/{id}", get(update_course))
        .route("/subjects/{course_id}", get(list_subjects))
        .route("/lessons/{subject_id}", get(list_lessons))
        .route("/get-courses", get(list_courses))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn store_courses(
    State(state): State<AppState>,
    Query(params): Query<StoreCoursesParams>,
) -> Result<Json<MessageResponse>, AppError> {
    let job = state.sync.begin_full_sync(params.token.as_deref()).await?;
    state.jobs.submit(job)?;
    Ok(Json(MessageResponse {
        message: FULL_SYNC_STARTED.to_string(),
    }))
}

async fn update_course(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    let job = state.sync.begin_update(id).await?;
    state.jobs.submit(job)?;
    Ok(Json(MessageResponse {
        message: UPDATE_STARTED.to_string(),
    }))
}

async fn list_subjects(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
) -> Result<Json<Vec<Subject>>, AppError> {
    let subjects = repository::fetch_subjects_by_course(&state.db, course_id).await?;
    Ok(Json(subjects))
}

async fn list_lessons(
    State(state): State<AppState>,
    Path(subject_id): Path<i64>,
) -> Result<Json<Vec<Lesson>>, AppError> {
    let lessons = repository::fetch_lessons_by_subject(&state.db, subject_id).await?;
    Ok(Json(lessons))
}

async fn list_courses(State(state): State<AppState>) -> Result<Json<CoursesResponse>, AppError> {
    let courses = repository::fetch_courses(&state.db).await?;
    Ok(Json(CoursesResponse { courses }))
}
