// GET /api/programs/v1/program-lookup/
//
// Lists program rows for the caller's enrolled courses, or for the learner
// named by ?national_id= when the caller is allowed to look others up.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use std::collections::HashMap;

use crate::app::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::programs::{self, has_program_lookup_access, is_valid_national_id, LookupEntry};

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<LookupEntry>>, ApiError> {
    let user_id = if params.is_empty() {
        user.user_id
    } else {
        resolve_learner(&state, &user, &params).await?
    };

    let entries =
        programs::list_program_lookups(state.courses.as_ref(), state.enrollments.as_ref(), user_id).await?;
    Ok(Json(entries))
}

/// Any query string switches to lookup by national id, which must then be valid
async fn resolve_learner(
    state: &AppState,
    user: &AuthUser,
    params: &HashMap<String, String>,
) -> Result<u64, ApiError> {
    if !has_program_lookup_access(user) {
        tracing::warn!("User {} denied program lookup by national id", user.user_id);
        return Err(ApiError::forbidden("You do not have permission to perform this action."));
    }

    let national_id = params.get("national_id").map(String::as_str).unwrap_or_default();
    if national_id.is_empty() {
        return Err(ApiError::invalid_parameter(
            "MISSING_NATIONAL_ID",
            "national_id query parameter is required.",
        ));
    }
    if !is_valid_national_id(national_id) {
        return Err(ApiError::unprocessable_entity(
            "INVALID_NATIONAL_ID",
            "national_id must be digits only and 10-15 characters.",
        ));
    }

    state
        .enrollments
        .find_user_by_national_id(national_id)
        .await?
        .ok_or_else(|| ApiError::not_found("No user matches the given national_id."))
}
