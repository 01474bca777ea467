use crate::state::SchoolState;
use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthBody {
    status: &'static str,
}

#[derive(Serialize)]
pub struct ReadyBody {
    status: &'static str,
    store: &'static str,
}

#[derive(Serialize)]
pub struct VersionBody {
    name: &'static str,
    version: &'static str,
}

pub async fn get_health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

pub async fn get_ready(State(state): State<SchoolState>) -> (StatusCode, Json<ReadyBody>) {
    if state.is_ready().await {
        (
            StatusCode::OK,
            Json(ReadyBody {
                status: "ok",
                store: "ok",
            }),
        )
    } else {
        warn!("Store is not answering");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyBody {
                status: "degraded",
                store: "unavailable",
            }),
        )
    }
}

pub async fn get_version() -> Json<VersionBody> {
    Json(VersionBody {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use crate::routes::test_server;
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn health_and_readiness() {
        let server = test_server();

        let health = server.get("/health").await;
        health.assert_status(StatusCode::OK);
        assert_eq!(health.json::<Value>(), json!({"status": "ok"}));

        let ready = server.get("/ready").await;
        ready.assert_status(StatusCode::OK);
        assert_eq!(ready.json::<Value>(), json!({"status": "ok", "store": "ok"}));
    }

    #[tokio::test]
    async fn version_reports_the_package() {
        let version = test_server().get("/version").await.json::<Value>();
        assert_eq!(version["name"], "escola");
        assert_eq!(version["version"], env!("CARGO_PKG_VERSION"));
    }
}
