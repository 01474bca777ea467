use crate::error::SchoolResult;
use async_trait::async_trait;
use std::fmt::Debug;

pub mod course;
pub mod memory;
pub mod postgres;
pub mod student;

pub use course::Course;
pub use student::Student;

pub type Id = i64;

/// Persistence over a single entity type, keyed by id.
#[async_trait]
pub trait Store<T: Send + 'static>: Debug + Send + Sync {
    async fn find_all(&self) -> SchoolResult<Vec<T>>;
    async fn find_by_id(&self, id: Id) -> SchoolResult<Option<T>>;
    async fn exists_by_id(&self, id: Id) -> SchoolResult<bool>;
    /// Inserts `record` when it carries no id, and replaces the stored record otherwise.
    ///
    /// The returned record always has its id populated.
    async fn save(&self, record: T) -> SchoolResult<T>;
    /// Overwrites the record stored under `id` in one step, or returns `None` without writing
    /// anything when there is no such record.
    async fn replace(&self, id: Id, record: T) -> SchoolResult<Option<T>>;
    /// Deleting an id that isn't stored is a no-op.
    async fn delete_by_id(&self, id: Id) -> SchoolResult<()>;
}

#[async_trait]
pub trait StudentStore: Store<Student> {
    /// Every student enrolled on the given course, ordered by id.
    async fn find_by_course(&self, course_id: Id) -> SchoolResult<Vec<Student>>;
}

pub trait CourseStore: Store<Course> {}
