use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use snafu::Snafu;
use std::num::ParseIntError;

pub type SchoolResult<T> = Result<T, SchoolError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SchoolError {
    #[snafu(display("Error opening database"))]
    OpenDatabase { source: sqlx::Error },
    #[snafu(display("Error making SQL query"))]
    MakeQuery { source: sqlx::Error },
    #[snafu(display("Error migrating DB schema"))]
    Migrate { source: sqlx::migrate::MigrateError },
    #[snafu(display("Unable to retrieve env var `{}`", name))]
    BadEnvVar {
        source: dotenvy::Error,
        name: &'static str,
    },
    #[snafu(display("Unable to parse DB port"))]
    ParsePort { source: ParseIntError },
    #[snafu(display("Unable to parse max DB connections"))]
    ParseMaxConnections { source: ParseIntError },
    #[snafu(display("Unable to parse request body limit"))]
    ParseBodyLimit { source: ParseIntError },
    #[snafu(display("Unknown store backend {:?}, expected `postgres` or `memory`", found))]
    UnknownStoreBackend { found: String },
    #[snafu(display("Unable to find student with ID: {}", id))]
    MissingStudent { id: i64 },
    #[snafu(display("Unable to find course with ID: {}", id))]
    MissingCourse { id: i64 },
    #[snafu(display("Student references course {}, which does not exist", id))]
    UnknownCourseReference { id: i64 },
    #[snafu(display("Course {} still has students enrolled", id))]
    CourseStillReferenced { id: i64 },
}

impl SchoolError {
    pub fn status_code(&self) -> StatusCode {
        const ISE: StatusCode = StatusCode::INTERNAL_SERVER_ERROR; //internal server error
        const NF: StatusCode = StatusCode::NOT_FOUND; //not found

        match self {
            Self::OpenDatabase { .. } | Self::Migrate { .. } => ISE,
            Self::MakeQuery { source } => match source {
                sqlx::Error::RowNotFound => NF,
                _ => ISE,
            },
            Self::BadEnvVar { .. }
            | Self::ParsePort { .. }
            | Self::ParseMaxConnections { .. }
            | Self::ParseBodyLimit { .. }
            | Self::UnknownStoreBackend { .. } => ISE,
            Self::MissingStudent { .. } | Self::MissingCourse { .. } => NF,
            Self::UnknownCourseReference { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::CourseStillReferenced { .. } => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for SchoolError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        // a missing entity is an expected outcome, and gets no body
        if status_code == StatusCode::NOT_FOUND {
            debug!(?self, "Not found");
            return status_code.into_response();
        }

        if status_code.is_server_error() {
            error!(?self, "Error!");
        } else {
            warn!(?self, "Rejected request");
        }
        (status_code, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
