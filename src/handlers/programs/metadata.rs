// GET|POST /api/programs/v1/metadata/:course_id
//
// Reads and writes the program metadata record kept in the course's
// other_course_settings. Auth and throttling happen in route layers before
// these handlers run.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::Value;

use crate::app::AppState;
use crate::auth::AuthUser;
use crate::courses::CourseKey;
use crate::error::ApiError;
use crate::programs::{self, has_studio_write_access, ProgramMetadata};

const FEATURE_FLAG: &str = "ENABLE_OTHER_COURSE_SETTINGS";

/// GET - stored metadata for the course, 404 if none was ever written
pub async fn get(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProgramMetadata>, ApiError> {
    let course_key = authorize(&state, &course_id, &user)?;

    let raw = programs::get_program_metadata(state.courses.as_ref(), &course_key)
        .await?
        .ok_or_else(|| ApiError::not_found("Program metadata not found"))?;

    // Stored data goes through the same checks as input
    let metadata = ProgramMetadata::from_value(&raw).map_err(|e| {
        tracing::warn!("Stored program metadata for {} failed validation: {}", course_key, e);
        ApiError::from(e)
    })?;

    Ok(Json(metadata))
}

/// POST - validate and replace the course's metadata
pub async fn post(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Extension(user): Extension<AuthUser>,
    body: Bytes,
) -> Result<(StatusCode, Json<ProgramMetadata>), ApiError> {
    let course_key = authorize(&state, &course_id, &user)?;

    let data: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Default::default())
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::invalid_json(format!("JSON parse error - {}", e)))?
    };

    let metadata = ProgramMetadata::from_value(&data)?;
    programs::update_program_metadata(state.courses.as_ref(), &course_key, &metadata, &user).await?;

    Ok((StatusCode::CREATED, Json(metadata)))
}

/// Feature flag, course id and write-access checks shared by both methods
fn authorize(state: &AppState, course_id: &str, user: &AuthUser) -> Result<CourseKey, ApiError> {
    if !state.config.features.enable_other_course_settings {
        return Err(ApiError::not_implemented(format!(
            "System Settings doesn't have enabled FEATURE {}",
            FEATURE_FLAG
        )));
    }

    let course_key = CourseKey::parse(course_id.trim_matches('/'))?;

    if state.config.security.require_studio_write_access && !has_studio_write_access(user, &course_key) {
        tracing::warn!("User {} denied write access to {}", user.user_id, course_key);
        return Err(ApiError::forbidden("You do not have permission to perform this action."));
    }

    Ok(course_key)
}
