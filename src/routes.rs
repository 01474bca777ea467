use crate::{
    routes::{
        courses::{create_course, delete_course, get_course, list_courses, update_course},
        health::{get_health, get_ready, get_version},
        students::{create_student, delete_student, get_student, list_students, update_student},
    },
    state::SchoolState,
};
use axum::{Router, routing::get};

pub mod courses;
pub mod health;
pub mod students;

pub fn router(state: SchoolState) -> Router {
    Router::new()
        .route("/alunos", get(list_students).post(create_student))
        .route(
            "/alunos/{id}",
            get(get_student).put(update_student).delete(delete_student),
        )
        .route("/cursos", get(list_courses).post(create_course))
        .route(
            "/cursos/{id}",
            get(get_course).put(update_course).delete(delete_course),
        )
        .route("/health", get(get_health))
        .route("/ready", get(get_ready))
        .route("/version", get(get_version))
        .with_state(state)
}

#[cfg(test)]
pub fn test_server() -> axum_test::TestServer {
    axum_test::TestServer::try_new(router(SchoolState::in_memory())).unwrap()
}
