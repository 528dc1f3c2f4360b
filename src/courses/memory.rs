use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{CourseKey, CourseSettings, CourseStore, StoreError};

/// Mock course store backed by a map.
///
/// Stands in for the host platform's modulestore in development and tests.
#[derive(Default)]
pub struct MemoryCourseStore {
    courses: RwLock<HashMap<String, CourseSettings>>,
}

impl MemoryCourseStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, course: CourseSettings) {
        let mut courses = self.courses.write().await;
        courses.insert(course.course_key.to_string(), course);
    }

    pub async fn len(&self) -> usize {
        self.courses.read().await.len()
    }
}

#[async_trait]
impl CourseStore for MemoryCourseStore {
    async fn get_course(&self, key: &CourseKey) -> Result<Option<CourseSettings>, StoreError> {
        let courses = self.courses.read().await;
        Ok(courses.get(&key.to_string()).cloned())
    }

    async fn update_course(&self, mut course: CourseSettings, user_id: u64) -> Result<(), StoreError> {
        course.edited_by = Some(user_id);
        course.edited_on = Some(Utc::now());

        let mut courses = self.courses.write().await;
        courses.insert(course.course_key.to_string(), course);
        Ok(())
    }
}
