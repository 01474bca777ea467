use crate::{
    config::RuntimeConfiguration,
    data::{CourseStore, StudentStore, memory::MemoryStore, postgres::PostgresStore},
    error::{MigrateSnafu, OpenDatabaseSnafu, SchoolResult},
};
use snafu::ResultExt;
use sqlx::{Pool, Postgres, postgres::PgPoolOptions};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct SchoolState {
    students: Arc<dyn StudentStore>,
    courses: Arc<dyn CourseStore>,
    pool: Option<Pool<Postgres>>,
}

impl SchoolState {
    pub async fn new(config: &RuntimeConfiguration) -> SchoolResult<Self> {
        let Some(db_config) = config.db_config() else {
            info!("Using in-memory store");
            return Ok(Self::in_memory());
        };

        let pool = PgPoolOptions::new()
            .max_connections(db_config.max_connections())
            .connect(&db_config.get_db_path())
            .await
            .context(OpenDatabaseSnafu)?;

        sqlx::migrate!().run(&pool).await.context(MigrateSnafu)?;
        info!("Connected to postgres, migrations applied");

        Ok(Self::postgres(pool))
    }

    pub fn postgres(pool: Pool<Postgres>) -> Self {
        let store = Arc::new(PostgresStore::new(pool.clone()));
        Self {
            students: store.clone(),
            courses: store,
            pool: Some(pool),
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            students: store.clone(),
            courses: store,
            pool: None,
        }
    }

    pub fn students(&self) -> &dyn StudentStore {
        self.students.as_ref()
    }

    pub fn courses(&self) -> &dyn CourseStore {
        self.courses.as_ref()
    }

    /// Whether the backing database answers. Always true for the in-memory store.
    pub async fn is_ready(&self) -> bool {
        match &self.pool {
            Some(pool) => sqlx::query("SELECT 1").execute(pool).await.is_ok(),
            None => true,
        }
    }

    pub async fn sensible_shutdown(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
            info!("Closed database pool");
        }
    }
}
