//! A process-local store with the same observable behaviour as the Postgres one.
//!
//! Both tables live behind a single lock so the course reference checks and
//! the restrict-on-delete check see a consistent view.

use crate::{
    data::{Course, CourseStore, Id, Store, Student, StudentStore},
    error::{CourseStillReferencedSnafu, SchoolResult, UnknownCourseReferenceSnafu},
};
use async_trait::async_trait;
use snafu::ensure;
use std::{collections::BTreeMap, sync::Arc};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    students: BTreeMap<Id, Student>,
    courses: BTreeMap<Id, Course>,
    last_student_id: Id,
    last_course_id: Id,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Mirrors an identity column: fresh ids count up from 1, and explicit ids push the counter forward.
fn assign_id(requested: Option<Id>, last: &mut Id) -> Id {
    match requested {
        Some(id) => {
            *last = (*last).max(id);
            id
        }
        None => {
            *last += 1;
            *last
        }
    }
}

#[async_trait]
impl Store<Student> for MemoryStore {
    async fn find_all(&self) -> SchoolResult<Vec<Student>> {
        Ok(self.tables.read().await.students.values().cloned().collect())
    }

    async fn find_by_id(&self, id: Id) -> SchoolResult<Option<Student>> {
        Ok(self.tables.read().await.students.get(&id).cloned())
    }

    async fn exists_by_id(&self, id: Id) -> SchoolResult<bool> {
        Ok(self.tables.read().await.students.contains_key(&id))
    }

    async fn save(&self, mut record: Student) -> SchoolResult<Student> {
        let mut tables = self.tables.write().await;

        if let Some(course_id) = record.course_id {
            ensure!(
                tables.courses.contains_key(&course_id),
                UnknownCourseReferenceSnafu { id: course_id }
            );
        }

        let id = assign_id(record.id, &mut tables.last_student_id);
        record.id = Some(id);
        tables.students.insert(id, record.clone());

        Ok(record)
    }

    async fn replace(&self, id: Id, mut record: Student) -> SchoolResult<Option<Student>> {
        let mut tables = self.tables.write().await;

        if !tables.students.contains_key(&id) {
            return Ok(None);
        }
        if let Some(course_id) = record.course_id {
            ensure!(
                tables.courses.contains_key(&course_id),
                UnknownCourseReferenceSnafu { id: course_id }
            );
        }

        record.id = Some(id);
        tables.students.insert(id, record.clone());

        Ok(Some(record))
    }

    async fn delete_by_id(&self, id: Id) -> SchoolResult<()> {
        self.tables.write().await.students.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl StudentStore for MemoryStore {
    async fn find_by_course(&self, course_id: Id) -> SchoolResult<Vec<Student>> {
        Ok(self
            .tables
            .read()
            .await
            .students
            .values()
            .filter(|student| student.course_id == Some(course_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Store<Course> for MemoryStore {
    async fn find_all(&self) -> SchoolResult<Vec<Course>> {
        Ok(self.tables.read().await.courses.values().cloned().collect())
    }

    async fn find_by_id(&self, id: Id) -> SchoolResult<Option<Course>> {
        Ok(self.tables.read().await.courses.get(&id).cloned())
    }

    async fn exists_by_id(&self, id: Id) -> SchoolResult<bool> {
        Ok(self.tables.read().await.courses.contains_key(&id))
    }

    async fn save(&self, mut record: Course) -> SchoolResult<Course> {
        let mut tables = self.tables.write().await;

        let id = assign_id(record.id, &mut tables.last_course_id);
        record.id = Some(id);
        tables.courses.insert(id, record.clone());

        Ok(record)
    }

    async fn replace(&self, id: Id, mut record: Course) -> SchoolResult<Option<Course>> {
        let mut tables = self.tables.write().await;

        let Some(stored) = tables.courses.get_mut(&id) else {
            return Ok(None);
        };
        record.id = Some(id);
        stored.clone_from(&record);

        Ok(Some(record))
    }

    async fn delete_by_id(&self, id: Id) -> SchoolResult<()> {
        let mut tables = self.tables.write().await;

        let referenced = tables
            .students
            .values()
            .any(|student| student.course_id == Some(id));
        ensure!(!referenced, CourseStillReferencedSnafu { id });

        tables.courses.remove(&id);
        Ok(())
    }
}

impl CourseStore for MemoryStore {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchoolError;

    fn course(name: &str) -> Course {
        Course {
            id: None,
            name: Some(name.into()),
            description: None,
            workload_hours: 10,
        }
    }

    fn student(name: &str, course_id: Option<Id>) -> Student {
        Student {
            id: None,
            name: Some(name.into()),
            email: None,
            birth_date: None,
            course_id,
        }
    }

    #[tokio::test]
    async fn ids_count_up_from_one_per_table() {
        let store = MemoryStore::new();

        let math = Store::<Course>::save(&store, course("Math")).await.unwrap();
        let art = Store::<Course>::save(&store, course("Art")).await.unwrap();
        let ana = Store::<Student>::save(&store, student("Ana", None)).await.unwrap();

        assert_eq!(math.id, Some(1));
        assert_eq!(art.id, Some(2));
        assert_eq!(ana.id, Some(1));
    }

    #[tokio::test]
    async fn save_with_an_id_replaces() {
        let store = MemoryStore::new();
        let math = Store::<Course>::save(&store, course("Math")).await.unwrap();

        let renamed = Course {
            name: Some("Maths".into()),
            ..math.clone()
        };
        Store::<Course>::save(&store, renamed.clone()).await.unwrap();

        let all = Store::<Course>::find_all(&store).await.unwrap();
        assert_eq!(all, vec![renamed]);
    }

    #[tokio::test]
    async fn explicit_ids_move_the_counter_forward() {
        let store = MemoryStore::new();

        let mut explicit = course("Math");
        explicit.id = Some(10);
        Store::<Course>::save(&store, explicit).await.unwrap();

        let next = Store::<Course>::save(&store, course("Art")).await.unwrap();
        assert_eq!(next.id, Some(11));
    }

    #[tokio::test]
    async fn students_must_reference_an_existing_course() {
        let store = MemoryStore::new();

        let err = Store::<Student>::save(&store, student("Ana", Some(3)))
            .await
            .unwrap_err();
        assert!(matches!(err, SchoolError::UnknownCourseReference { id: 3 }));
        assert!(Store::<Student>::find_all(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn find_by_course_only_returns_enrolled_students() {
        let store = MemoryStore::new();
        let math = Store::<Course>::save(&store, course("Math")).await.unwrap();
        let math_id = math.id.unwrap();

        let ana = Store::<Student>::save(&store, student("Ana", Some(math_id)))
            .await
            .unwrap();
        Store::<Student>::save(&store, student("Bea", None)).await.unwrap();

        assert_eq!(store.find_by_course(math_id).await.unwrap(), vec![ana]);
        assert!(store.find_by_course(math_id + 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_a_course_with_students_is_restricted() {
        let store = MemoryStore::new();
        let math = Store::<Course>::save(&store, course("Math")).await.unwrap();
        let math_id = math.id.unwrap();
        let ana = Store::<Student>::save(&store, student("Ana", Some(math_id)))
            .await
            .unwrap();

        let err = Store::<Course>::delete_by_id(&store, math_id)
            .await
            .unwrap_err();
        assert!(matches!(err, SchoolError::CourseStillReferenced { .. }));
        assert!(Store::<Course>::exists_by_id(&store, math_id).await.unwrap());

        Store::<Student>::delete_by_id(&store, ana.id.unwrap())
            .await
            .unwrap();
        Store::<Course>::delete_by_id(&store, math_id).await.unwrap();
        assert!(!Store::<Course>::exists_by_id(&store, math_id).await.unwrap());
    }

    #[tokio::test]
    async fn replace_only_touches_existing_records() {
        let store = MemoryStore::new();

        let missing = Store::<Course>::replace(&store, 4, course("Math")).await.unwrap();
        assert_eq!(missing, None);
        assert!(Store::<Course>::find_all(&store).await.unwrap().is_empty());

        Store::<Course>::save(&store, course("Math")).await.unwrap();
        let replaced = Store::<Course>::replace(&store, 1, course("Maths"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(replaced.id, Some(1));
        assert_eq!(
            Store::<Course>::find_by_id(&store, 1).await.unwrap(),
            Some(replaced)
        );

        // a replace after a delete must not bring the record back
        Store::<Course>::delete_by_id(&store, 1).await.unwrap();
        assert_eq!(
            Store::<Course>::replace(&store, 1, course("Math")).await.unwrap(),
            None
        );
        assert!(!Store::<Course>::exists_by_id(&store, 1).await.unwrap());
    }

    #[tokio::test]
    async fn replacing_with_an_unknown_course_leaves_the_student_alone() {
        let store = MemoryStore::new();
        let ana = Store::<Student>::save(&store, student("Ana", None)).await.unwrap();
        let ana_id = ana.id.unwrap();

        let err = Store::<Student>::replace(&store, ana_id, student("Bea", Some(7)))
            .await
            .unwrap_err();
        assert!(matches!(err, SchoolError::UnknownCourseReference { id: 7 }));
        assert_eq!(
            Store::<Student>::find_by_id(&store, ana_id).await.unwrap(),
            Some(ana)
        );

        assert_eq!(
            Store::<Student>::replace(&store, ana_id + 1, student("Bea", None))
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn deleting_an_unknown_id_is_a_no_op() {
        let store = MemoryStore::new();
        Store::<Student>::delete_by_id(&store, 42).await.unwrap();
        Store::<Course>::delete_by_id(&store, 42).await.unwrap();
    }
}
