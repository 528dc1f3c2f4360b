pub mod enrollment;
pub mod key;
pub mod memory;
pub mod postgres;
pub mod store;

pub use enrollment::{EnrollmentStore, MemoryEnrollmentStore};
pub use key::{CourseKey, CourseKeyError};
pub use memory::MemoryCourseStore;
pub use postgres::{PgCourseStore, PgEnrollmentStore};
pub use store::{CourseSettings, CourseStore, StoreError};
