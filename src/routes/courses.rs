use crate::{
    data::{
        Id, Student,
        course::{Course, CourseForm, CourseView},
    },
    error::{MissingCourseSnafu, SchoolResult},
    state::SchoolState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use snafu::{OptionExt, ensure};
use std::collections::HashMap;

async fn view_course(state: &SchoolState, course: Course) -> SchoolResult<CourseView> {
    let students = match course.id {
        Some(id) => state.students().find_by_course(id).await?,
        None => Vec::new(),
    };
    Ok(CourseView::new(course, students))
}

pub async fn list_courses(State(state): State<SchoolState>) -> SchoolResult<Json<Vec<CourseView>>> {
    let (courses, students) =
        tokio::try_join!(state.courses().find_all(), state.students().find_all())?;

    let mut enrolments: HashMap<Id, Vec<Student>> = HashMap::new();
    for student in students {
        if let Some(course_id) = student.course_id {
            enrolments.entry(course_id).or_default().push(student);
        }
    }

    Ok(Json(
        courses
            .into_iter()
            .map(|course| {
                let students = course
                    .id
                    .and_then(|id| enrolments.remove(&id))
                    .unwrap_or_default();
                CourseView::new(course, students)
            })
            .collect(),
    ))
}

pub async fn create_course(
    State(state): State<SchoolState>,
    Json(form): Json<CourseForm>,
) -> SchoolResult<(StatusCode, Json<CourseView>)> {
    let course = state.courses().save(form.into_course(None)).await?;
    info!(id = ?course.id, "Created course");

    Ok((StatusCode::CREATED, Json(view_course(&state, course).await?)))
}

pub async fn get_course(
    State(state): State<SchoolState>,
    Path(id): Path<Id>,
) -> SchoolResult<Json<CourseView>> {
    let course = state
        .courses()
        .find_by_id(id)
        .await?
        .context(MissingCourseSnafu { id })?;

    Ok(Json(view_course(&state, course).await?))
}

pub async fn update_course(
    State(state): State<SchoolState>,
    Path(id): Path<Id>,
    Json(form): Json<CourseForm>,
) -> SchoolResult<Json<CourseView>> {
    let course = state
        .courses()
        .replace(id, form.into_course(Some(id)))
        .await?
        .context(MissingCourseSnafu { id })?;
    debug!(id, "Replaced course");

    Ok(Json(view_course(&state, course).await?))
}

/// Courses with students still enrolled are not deleted, see [`crate::error::SchoolError::CourseStillReferenced`].
pub async fn delete_course(
    State(state): State<SchoolState>,
    Path(id): Path<Id>,
) -> SchoolResult<StatusCode> {
    ensure!(
        state.courses().exists_by_id(id).await?,
        MissingCourseSnafu { id }
    );

    state.courses().delete_by_id(id).await?;
    info!(id, "Deleted course");

    Ok(StatusCode::NO_CONTENT)
}
