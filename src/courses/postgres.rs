use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use tracing::{info, warn};

use super::{CourseKey, CourseSettings, CourseStore, EnrollmentStore, StoreError};

const CREATE_COURSE_SETTINGS: &str = r#"
    CREATE TABLE IF NOT EXISTS course_settings (
        course_id TEXT PRIMARY KEY,
        display_name TEXT,
        start_at TIMESTAMPTZ,
        end_at TIMESTAMPTZ,
        effort TEXT,
        other_course_settings JSONB NOT NULL DEFAULT '{}'::jsonb,
        edited_by BIGINT,
        edited_on TIMESTAMPTZ
    )
"#;

const CREATE_COURSE_ENROLLMENTS: &str = r#"
    CREATE TABLE IF NOT EXISTS course_enrollments (
        user_id BIGINT NOT NULL,
        course_id TEXT NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (user_id, course_id)
    )
"#;

const CREATE_USER_EXTRA_INFO: &str = r#"
    CREATE TABLE IF NOT EXISTS user_extra_info (
        user_id BIGINT PRIMARY KEY,
        national_id TEXT UNIQUE
    )
"#;

/// Open a pool against `url`
pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;
    info!("Created database pool (max_connections={})", max_connections);
    Ok(pool)
}

/// Course settings kept in a `course_settings` table, one row per course
#[derive(Clone)]
pub struct PgCourseStore {
    pool: PgPool,
}

impl PgCourseStore {
    /// Wrap an existing pool and make sure the table exists
    pub async fn new(pool: PgPool) -> Result<Self, StoreError> {
        sqlx::query(CREATE_COURSE_SETTINGS).execute(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl CourseStore for PgCourseStore {
    async fn get_course(&self, key: &CourseKey) -> Result<Option<CourseSettings>, StoreError> {
        let query = r#"
            SELECT display_name, start_at, end_at, effort,
                   other_course_settings, edited_by, edited_on
            FROM course_settings
            WHERE course_id = $1
        "#;

        let row = sqlx::query(query)
            .bind(key.to_string())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let settings: Value = row.try_get("other_course_settings")?;
        let Value::Object(other_course_settings) = settings else {
            return Err(StoreError::Corrupt {
                course: key.to_string(),
                reason: "other_course_settings is not an object".to_string(),
            });
        };
        let edited_by: Option<i64> = row.try_get("edited_by")?;
        let edited_on: Option<DateTime<Utc>> = row.try_get("edited_on")?;

        Ok(Some(CourseSettings {
            course_key: key.clone(),
            display_name: row.try_get("display_name")?,
            start: row.try_get("start_at")?,
            end: row.try_get("end_at")?,
            effort: row.try_get("effort")?,
            other_course_settings,
            edited_by: edited_by.map(|id| id as u64),
            edited_on,
        }))
    }

    async fn update_course(&self, course: CourseSettings, user_id: u64) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO course_settings
                (course_id, display_name, start_at, end_at, effort,
                 other_course_settings, edited_by, edited_on)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (course_id) DO UPDATE
            SET display_name = EXCLUDED.display_name,
                start_at = EXCLUDED.start_at,
                end_at = EXCLUDED.end_at,
                effort = EXCLUDED.effort,
                other_course_settings = EXCLUDED.other_course_settings,
                edited_by = EXCLUDED.edited_by,
                edited_on = EXCLUDED.edited_on
        "#;

        sqlx::query(query)
            .bind(course.course_key.to_string())
            .bind(course.display_name)
            .bind(course.start)
            .bind(course.end)
            .bind(course.effort)
            .bind(Value::Object(course.other_course_settings))
            .bind(user_id as i64)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Enrollments and learner profiles kept next to the course settings
#[derive(Clone)]
pub struct PgEnrollmentStore {
    pool: PgPool,
}

impl PgEnrollmentStore {
    pub async fn new(pool: PgPool) -> Result<Self, StoreError> {
        sqlx::query(CREATE_COURSE_ENROLLMENTS).execute(&pool).await?;
        sqlx::query(CREATE_USER_EXTRA_INFO).execute(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl EnrollmentStore for PgEnrollmentStore {
    async fn enrolled_courses(&self, user_id: u64) -> Result<Vec<CourseKey>, StoreError> {
        let query = r#"
            SELECT course_id
            FROM course_enrollments
            WHERE user_id = $1 AND is_active
            ORDER BY created
        "#;

        let rows = sqlx::query(query)
            .bind(user_id as i64)
            .fetch_all(&self.pool)
            .await?;

        let mut courses = Vec::with_capacity(rows.len());
        for row in rows {
            let course_id: String = row.try_get("course_id")?;
            match CourseKey::parse(&course_id) {
                Ok(key) => courses.push(key),
                Err(e) => warn!("Skipping enrollment of user {}: {}", user_id, e),
            }
        }
        Ok(courses)
    }

    async fn find_user_by_national_id(&self, national_id: &str) -> Result<Option<u64>, StoreError> {
        let row = sqlx::query("SELECT user_id FROM user_extra_info WHERE national_id = $1")
            .bind(national_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_get::<i64, _>("user_id").map(|id| id as u64))
            .transpose()
            .map_err(StoreError::from)
    }
}
