//! Access-token lifecycle. A course whose token was rejected upstream is
//! "frozen": the token is cleared, the course stays, and only a full sync with
//! a fresh token brings it back.

use sqlx::SqlitePool;
use tracing::warn;

use crate::db::repository;
use crate::models::Course;

pub fn is_frozen(course: &Course) -> bool {
    course.access_token.is_none()
}

/// Freezes the course if it still holds the rejected token. A token attached
/// since then by a full sync is left alone.
pub async fn freeze(db: &SqlitePool, course_id: i64, rejected: &str) -> Result<bool, sqlx::Error> {
    let cleared = repository::clear_course_token(db, course_id, rejected).await?;
    if cleared {
        warn!("Removed invalid token for course {}", course_id);
    }
    Ok(cleared)
}

/// One token may have been stored on several courses by the same full sync.
pub async fn revoke_everywhere(db: &SqlitePool, token: &str) -> Result<u64, sqlx::Error> {
    let cleared = repository::clear_token_everywhere(db, token).await?;
    warn!("Invalid access token removed from {} course(s)", cleared);
    Ok(cleared)
}
