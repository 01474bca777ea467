use crate::data::{
    Id,
    student::{Student, StudentSummary},
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct Course {
    pub id: Option<Id>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub workload_hours: i32,
}

/// Request body for creating or replacing a course.
///
/// `id` and `alunos` in the body are ignored, the enrolment list is derived
/// from the students themselves.
#[derive(Deserialize, Debug, Default)]
pub struct CourseForm {
    #[serde(rename = "nome")]
    pub name: Option<String>,
    #[serde(rename = "descricao")]
    pub description: Option<String>,
    #[serde(rename = "cargaHoraria")]
    pub workload_hours: Option<i32>,
}

impl CourseForm {
    pub fn into_course(self, id: Option<Id>) -> Course {
        let Self {
            name,
            description,
            workload_hours,
        } = self;

        Course {
            id,
            name,
            description,
            workload_hours: workload_hours.unwrap_or_default(),
        }
    }
}

/// A course without its students, as embedded in a student's `curso`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CourseSummary {
    pub id: Option<Id>,
    #[serde(rename = "nome")]
    pub name: Option<String>,
    #[serde(rename = "descricao")]
    pub description: Option<String>,
    #[serde(rename = "cargaHoraria")]
    pub workload_hours: i32,
}

impl From<Course> for CourseSummary {
    fn from(
        Course {
            id,
            name,
            description,
            workload_hours,
        }: Course,
    ) -> Self {
        Self {
            id,
            name,
            description,
            workload_hours,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CourseView {
    #[serde(flatten)]
    pub course: CourseSummary,
    #[serde(rename = "alunos")]
    pub students: Vec<StudentSummary>,
}

impl CourseView {
    pub fn new(course: Course, students: Vec<Student>) -> Self {
        Self {
            course: course.into(),
            students: students.into_iter().map(Into::into).collect(),
        }
    }
}
