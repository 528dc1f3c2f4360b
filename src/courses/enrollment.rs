use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{CourseKey, StoreError};

/// Learner enrollments and profile lookups from the host platform
#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    /// Courses the user is actively enrolled in, oldest enrollment first
    async fn enrolled_courses(&self, user_id: u64) -> Result<Vec<CourseKey>, StoreError>;

    /// Resolve a user from the national id on their profile
    async fn find_user_by_national_id(&self, national_id: &str) -> Result<Option<u64>, StoreError>;
}

#[derive(Default)]
pub struct MemoryEnrollmentStore {
    enrollments: RwLock<HashMap<u64, Vec<CourseKey>>>,
    national_ids: RwLock<HashMap<String, u64>>,
}

impl MemoryEnrollmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn enroll(&self, user_id: u64, course_key: CourseKey) {
        let mut enrollments = self.enrollments.write().await;
        let courses = enrollments.entry(user_id).or_default();
        if !courses.contains(&course_key) {
            courses.push(course_key);
        }
    }

    pub async fn set_national_id(&self, user_id: u64, national_id: impl Into<String>) {
        self.national_ids.write().await.insert(national_id.into(), user_id);
    }
}

#[async_trait]
impl EnrollmentStore for MemoryEnrollmentStore {
    async fn enrolled_courses(&self, user_id: u64) -> Result<Vec<CourseKey>, StoreError> {
        let enrollments = self.enrollments.read().await;
        Ok(enrollments.get(&user_id).cloned().unwrap_or_default())
    }

    async fn find_user_by_national_id(&self, national_id: &str) -> Result<Option<u64>, StoreError> {
        Ok(self.national_ids.read().await.get(national_id).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enrollments_keep_order_without_duplicates() {
        let store = MemoryEnrollmentStore::new();
        let first = CourseKey::parse("course-v1:edX+A+1").unwrap();
        let second = CourseKey::parse("course-v1:edX+B+1").unwrap();

        store.enroll(3, first.clone()).await;
        store.enroll(3, second.clone()).await;
        store.enroll(3, first.clone()).await;

        assert_eq!(store.enrolled_courses(3).await.unwrap(), vec![first, second]);
        assert!(store.enrolled_courses(4).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn resolves_users_by_national_id() {
        let store = MemoryEnrollmentStore::new();
        store.set_national_id(8, "1222888000").await;

        assert_eq!(store.find_user_by_national_id("1222888000").await.unwrap(), Some(8));
        assert_eq!(store.find_user_by_national_id("1000000000").await.unwrap(), None);
    }
}
