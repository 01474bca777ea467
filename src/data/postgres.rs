use crate::{
    data::{Course, CourseStore, Id, Store, Student, StudentStore},
    error::{MakeQuerySnafu, SchoolError, SchoolResult},
};
use async_trait::async_trait;
use snafu::ResultExt;
use sqlx::{Pool, Postgres};

const STUDENT_COLUMNS: &str = "id, name, email, birth_date, course_id";
const COURSE_COLUMNS: &str = "id, name, description, workload_hours";

/// Student and course tables in one Postgres database.
///
/// Referential integrity between them is left to the foreign key in the
/// migrations, violations are translated into domain errors here.
#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: Pool<Postgres>,
}

impl PostgresStore {
    pub const fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(|db_error| db_error.is_foreign_key_violation())
}

/// A rejected student write is only a bad course reference if it actually named a course.
fn student_write_error(course_id: Option<Id>, source: sqlx::Error) -> SchoolError {
    match course_id {
        Some(id) if is_foreign_key_violation(&source) => SchoolError::UnknownCourseReference { id },
        _ => SchoolError::MakeQuery { source },
    }
}

#[async_trait]
impl Store<Student> for PostgresStore {
    async fn find_all(&self) -> SchoolResult<Vec<Student>> {
        sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM public.students ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .context(MakeQuerySnafu)
    }

    async fn find_by_id(&self, id: Id) -> SchoolResult<Option<Student>> {
        sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM public.students WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context(MakeQuerySnafu)
    }

    async fn exists_by_id(&self, id: Id) -> SchoolResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM public.students WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .context(MakeQuerySnafu)
    }

    async fn save(&self, record: Student) -> SchoolResult<Student> {
        let Student {
            id,
            name,
            email,
            birth_date,
            course_id,
        } = record;

        let sql = if id.is_some() {
            format!(
                "INSERT INTO public.students (id, name, email, birth_date, course_id) VALUES ($1, $2, $3, $4, $5) \
                 ON CONFLICT (id) DO UPDATE SET name = excluded.name, email = excluded.email, \
                 birth_date = excluded.birth_date, course_id = excluded.course_id \
                 RETURNING {STUDENT_COLUMNS}"
            )
        } else {
            format!(
                "INSERT INTO public.students (name, email, birth_date, course_id) VALUES ($1, $2, $3, $4) \
                 RETURNING {STUDENT_COLUMNS}"
            )
        };

        let mut query = sqlx::query_as::<_, Student>(&sql);
        if let Some(id) = id {
            query = query.bind(id);
        }

        query
            .bind(name)
            .bind(email)
            .bind(birth_date)
            .bind(course_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|source| student_write_error(course_id, source))
    }

    async fn replace(&self, id: Id, record: Student) -> SchoolResult<Option<Student>> {
        let Student {
            name,
            email,
            birth_date,
            course_id,
            ..
        } = record;

        sqlx::query_as::<_, Student>(&format!(
            "UPDATE public.students SET name = $2, email = $3, birth_date = $4, course_id = $5 \
             WHERE id = $1 RETURNING {STUDENT_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(birth_date)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|source| student_write_error(course_id, source))
    }

    async fn delete_by_id(&self, id: Id) -> SchoolResult<()> {
        sqlx::query("DELETE FROM public.students WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context(MakeQuerySnafu)?;
        Ok(())
    }
}

#[async_trait]
impl StudentStore for PostgresStore {
    async fn find_by_course(&self, course_id: Id) -> SchoolResult<Vec<Student>> {
        sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM public.students WHERE course_id = $1 ORDER BY id"
        ))
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
        .context(MakeQuerySnafu)
    }
}

#[async_trait]
impl Store<Course> for PostgresStore {
    async fn find_all(&self) -> SchoolResult<Vec<Course>> {
        sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM public.courses ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .context(MakeQuerySnafu)
    }

    async fn find_by_id(&self, id: Id) -> SchoolResult<Option<Course>> {
        sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM public.courses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context(MakeQuerySnafu)
    }

    async fn exists_by_id(&self, id: Id) -> SchoolResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM public.courses WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .context(MakeQuerySnafu)
    }

    async fn save(&self, record: Course) -> SchoolResult<Course> {
        let Course {
            id,
            name,
            description,
            workload_hours,
        } = record;

        let sql = if id.is_some() {
            format!(
                "INSERT INTO public.courses (id, name, description, workload_hours) VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (id) DO UPDATE SET name = excluded.name, description = excluded.description, \
                 workload_hours = excluded.workload_hours \
                 RETURNING {COURSE_COLUMNS}"
            )
        } else {
            format!(
                "INSERT INTO public.courses (name, description, workload_hours) VALUES ($1, $2, $3) \
                 RETURNING {COURSE_COLUMNS}"
            )
        };

        let mut query = sqlx::query_as::<_, Course>(&sql);
        if let Some(id) = id {
            query = query.bind(id);
        }

        query
            .bind(name)
            .bind(description)
            .bind(workload_hours)
            .fetch_one(&self.pool)
            .await
            .context(MakeQuerySnafu)
    }

    async fn replace(&self, id: Id, record: Course) -> SchoolResult<Option<Course>> {
        let Course {
            name,
            description,
            workload_hours,
            ..
        } = record;

        sqlx::query_as::<_, Course>(&format!(
            "UPDATE public.courses SET name = $2, description = $3, workload_hours = $4 \
             WHERE id = $1 RETURNING {COURSE_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(workload_hours)
        .fetch_optional(&self.pool)
        .await
        .context(MakeQuerySnafu)
    }

    async fn delete_by_id(&self, id: Id) -> SchoolResult<()> {
        sqlx::query("DELETE FROM public.courses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|source| {
                if is_foreign_key_violation(&source) {
                    SchoolError::CourseStillReferenced { id }
                } else {
                    SchoolError::MakeQuery { source }
                }
            })?;
        Ok(())
    }
}

impl CourseStore for PostgresStore {}
