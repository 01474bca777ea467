use crate::data::{Id, course::{Course, CourseSummary}};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct Student {
    pub id: Option<Id>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub course_id: Option<Id>,
}

/// The course a student payload points at. Only the id is read.
#[derive(Deserialize, Debug)]
pub struct CourseReference {
    pub id: Option<Id>,
}

/// Request body for creating or replacing a student. An `id` in the body is ignored.
#[derive(Deserialize, Debug, Default)]
pub struct StudentForm {
    #[serde(rename = "nome")]
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "dataNascimento")]
    pub birth_date: Option<NaiveDate>,
    #[serde(rename = "curso")]
    pub course: Option<CourseReference>,
}

impl StudentForm {
    pub fn into_student(self, id: Option<Id>) -> Student {
        let Self {
            name,
            email,
            birth_date,
            course,
        } = self;

        Student {
            id,
            name,
            email,
            birth_date,
            course_id: course.and_then(|course| course.id),
        }
    }
}

/// A student without its course, as embedded in a course's `alunos`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct StudentSummary {
    pub id: Option<Id>,
    #[serde(rename = "nome")]
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "dataNascimento")]
    pub birth_date: Option<NaiveDate>,
}

impl From<Student> for StudentSummary {
    fn from(
        Student {
            id,
            name,
            email,
            birth_date,
            course_id: _,
        }: Student,
    ) -> Self {
        Self {
            id,
            name,
            email,
            birth_date,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct StudentView {
    #[serde(flatten)]
    pub student: StudentSummary,
    #[serde(rename = "curso")]
    pub course: Option<CourseSummary>,
}

impl StudentView {
    pub fn new(student: Student, course: Option<Course>) -> Self {
        Self {
            student: student.into(),
            course: course.map(Into::into),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn form_reads_only_the_course_id() {
        let form: StudentForm = serde_json::from_value(json!({
            "id": 99,
            "nome": "Ana",
            "email": "a@x.com",
            "dataNascimento": "2000-01-01",
            "curso": {"id": 1, "nome": "ignored", "alunos": []}
        }))
        .unwrap();

        let student = form.into_student(Some(4));
        assert_eq!(
            student,
            Student {
                id: Some(4),
                name: Some("Ana".into()),
                email: Some("a@x.com".into()),
                birth_date: NaiveDate::from_ymd_opt(2000, 1, 1),
                course_id: Some(1),
            }
        );
    }

    #[test]
    fn omitted_fields_become_null() {
        let form: StudentForm = serde_json::from_value(json!({"nome": "Bea"})).unwrap();
        let student = form.into_student(None);

        assert_eq!(student.name.as_deref(), Some("Bea"));
        assert_eq!(student.email, None);
        assert_eq!(student.birth_date, None);
        assert_eq!(student.course_id, None);
    }

    #[test]
    fn view_embeds_the_course_without_students() {
        let student = Student {
            id: Some(1),
            name: Some("Ana".into()),
            email: None,
            birth_date: NaiveDate::from_ymd_opt(2000, 1, 1),
            course_id: Some(2),
        };
        let course = Course {
            id: Some(2),
            name: Some("Math".into()),
            description: Some("Intro".into()),
            workload_hours: 40,
        };

        let value = serde_json::to_value(StudentView::new(student, Some(course))).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 1,
                "nome": "Ana",
                "email": null,
                "dataNascimento": "2000-01-01",
                "curso": {"id": 2, "nome": "Math", "descricao": "Intro", "cargaHoraria": 40}
            })
        );
    }
}
