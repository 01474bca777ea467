use crate::{
    data::{
        Course, Id,
        student::{Student, StudentForm, StudentView},
    },
    error::{MissingStudentSnafu, SchoolResult},
    state::SchoolState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use snafu::{OptionExt, ensure};
use std::collections::HashMap;

async fn view_student(state: &SchoolState, student: Student) -> SchoolResult<StudentView> {
    let course = match student.course_id {
        Some(course_id) => state.courses().find_by_id(course_id).await?,
        None => None,
    };
    Ok(StudentView::new(student, course))
}

pub async fn list_students(
    State(state): State<SchoolState>,
) -> SchoolResult<Json<Vec<StudentView>>> {
    let (students, courses) =
        tokio::try_join!(state.students().find_all(), state.courses().find_all())?;

    let courses: HashMap<Id, Course> = courses
        .into_iter()
        .filter_map(|course| course.id.map(|id| (id, course)))
        .collect();

    Ok(Json(
        students
            .into_iter()
            .map(|student| {
                let course = student
                    .course_id
                    .and_then(|course_id| courses.get(&course_id).cloned());
                StudentView::new(student, course)
            })
            .collect(),
    ))
}

pub async fn create_student(
    State(state): State<SchoolState>,
    Json(form): Json<StudentForm>,
) -> SchoolResult<(StatusCode, Json<StudentView>)> {
    let student = state.students().save(form.into_student(None)).await?;
    info!(id = ?student.id, "Created student");

    Ok((StatusCode::CREATED, Json(view_student(&state, student).await?)))
}

pub async fn get_student(
    State(state): State<SchoolState>,
    Path(id): Path<Id>,
) -> SchoolResult<Json<StudentView>> {
    let student = state
        .students()
        .find_by_id(id)
        .await?
        .context(MissingStudentSnafu { id })?;

    Ok(Json(view_student(&state, student).await?))
}

pub async fn update_student(
    State(state): State<SchoolState>,
    Path(id): Path<Id>,
    Json(form): Json<StudentForm>,
) -> SchoolResult<Json<StudentView>> {
    let student = state
        .students()
        .replace(id, form.into_student(Some(id)))
        .await?
        .context(MissingStudentSnafu { id })?;
    debug!(id, "Replaced student");

    Ok(Json(view_student(&state, student).await?))
}

pub async fn delete_student(
    State(state): State<SchoolState>,
    Path(id): Path<Id>,
) -> SchoolResult<StatusCode> {
    ensure!(
        state.students().exists_by_id(id).await?,
        MissingStudentSnafu { id }
    );

    state.students().delete_by_id(id).await?;
    info!(id, "Deleted student");

    Ok(StatusCode::NO_CONTENT)
}
