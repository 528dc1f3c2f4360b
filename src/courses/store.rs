use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use super::CourseKey;

/// Errors from a course settings backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt settings for {course}: {reason}")]
    Corrupt { course: String, reason: String },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// The host platform's per-course configuration object.
///
/// `other_course_settings` is a free-form JSON object the platform lets
/// extensions hang their own data on. The catalog fields (`display_name`,
/// `start`, `end`, `effort`) are owned by the platform and only read here.
#[derive(Debug, Clone)]
pub struct CourseSettings {
    pub course_key: CourseKey,
    pub display_name: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Free-text effort estimate, usually `H` or `H:MM`
    pub effort: Option<String>,
    pub other_course_settings: Map<String, Value>,
    pub edited_by: Option<u64>,
    pub edited_on: Option<DateTime<Utc>>,
}

impl CourseSettings {
    pub fn new(course_key: CourseKey) -> Self {
        Self {
            course_key,
            display_name: None,
            start: None,
            end: None,
            effort: None,
            other_course_settings: Map::new(),
            edited_by: None,
            edited_on: None,
        }
    }
}

#[async_trait]
pub trait CourseStore: Send + Sync {
    /// Load the settings object for a course, `None` if the store has never seen it
    async fn get_course(&self, key: &CourseKey) -> Result<Option<CourseSettings>, StoreError>;

    /// Persist a settings object, stamping the editing user
    async fn update_course(&self, course: CourseSettings, user_id: u64) -> Result<(), StoreError>;

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
