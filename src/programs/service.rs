//! Read and write program metadata inside a course's `other_course_settings`.

use serde_json::Value;
use tracing::info;

use super::ProgramMetadata;
use crate::auth::AuthUser;
use crate::courses::{CourseKey, CourseSettings, CourseStore, StoreError};

/// Key under `other_course_settings` holding the record
pub const PROGRAM_METADATA_KEY: &str = "program_metadata_v1";

/// Raw stored metadata for a course.
///
/// Returns `None` when the course is unknown, the key is absent, or the stored
/// object is empty. Callers validate the value before exposing it.
pub async fn get_program_metadata(
    store: &dyn CourseStore,
    course_key: &CourseKey,
) -> Result<Option<Value>, StoreError> {
    let Some(course) = store.get_course(course_key).await? else {
        return Ok(None);
    };

    Ok(course
        .other_course_settings
        .get(PROGRAM_METADATA_KEY)
        .filter(|v| !is_empty(v))
        .cloned())
}

/// Replace the stored metadata for a course, provisioning its settings on first write
pub async fn update_program_metadata(
    store: &dyn CourseStore,
    course_key: &CourseKey,
    metadata: &ProgramMetadata,
    user: &AuthUser,
) -> Result<(), StoreError> {
    let mut course = match store.get_course(course_key).await? {
        Some(course) => course,
        None => {
            info!("Provisioning course settings for {}", course_key);
            CourseSettings::new(course_key.clone())
        }
    };

    course
        .other_course_settings
        .insert(PROGRAM_METADATA_KEY.to_string(), metadata.to_value());
    store.update_course(course, user.user_id).await?;

    info!("Program metadata for {} updated by user {}", course_key, user.user_id);
    Ok(())
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
