use crate::error::{
    BadEnvVarSnafu, ParseBodyLimitSnafu, ParseMaxConnectionsSnafu, ParsePortSnafu, SchoolError,
    SchoolResult, UnknownStoreBackendSnafu,
};
use dotenvy::var;
use secrecy::{ExposeSecret, SecretString};
use snafu::ResultExt;
use std::{env::VarError, str::FromStr, sync::Arc};

type Lookup<'a> = &'a dyn Fn(&'static str) -> Result<String, dotenvy::Error>;

const DEFAULT_SERVER_IP: &str = "127.0.0.1:8080";
const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;
const DEFAULT_MAX_CONNECTIONS: u32 = 15;

/// Which [`crate::data::Store`] implementation backs the running server.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = SchoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" | "in-memory" => Ok(Self::Memory),
            _ => UnknownStoreBackendSnafu { found: s }.fail(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RuntimeConfiguration {
    server_ip: String,
    body_limit: usize,
    store_backend: StoreBackend,
    db_config: Option<Arc<DbConfig>>,
}

impl RuntimeConfiguration {
    pub fn new() -> SchoolResult<Self> {
        Self::from_lookup(&|name: &'static str| var(name))
    }

    fn from_lookup(lookup: Lookup) -> SchoolResult<Self> {
        let server_ip =
            optional_var(lookup, "SCHOOL_SERVER_IP")?.unwrap_or_else(|| DEFAULT_SERVER_IP.into());
        let body_limit = match optional_var(lookup, "SCHOOL_BODY_LIMIT")? {
            Some(limit) => limit.parse().context(ParseBodyLimitSnafu)?,
            None => DEFAULT_BODY_LIMIT,
        };
        let store_backend = match optional_var(lookup, "SCHOOL_STORE")? {
            Some(backend) => backend.parse()?,
            None => StoreBackend::Postgres,
        };

        let db_config = match store_backend {
            StoreBackend::Postgres => Some(Arc::new(DbConfig::from_lookup(lookup)?)),
            StoreBackend::Memory => None,
        };

        Ok(Self {
            server_ip,
            body_limit,
            store_backend,
            db_config,
        })
    }

    pub fn server_ip(&self) -> &str {
        &self.server_ip
    }

    pub const fn body_limit(&self) -> usize {
        self.body_limit
    }

    pub const fn store_backend(&self) -> StoreBackend {
        self.store_backend
    }

    /// Only present for [`StoreBackend::Postgres`].
    pub fn db_config(&self) -> Option<Arc<DbConfig>> {
        self.db_config.clone()
    }
}

#[derive(Debug)]
pub struct DbConfig {
    user: String,
    password: SecretString,
    path: String,
    port: u16,
    database: String,
    max_connections: u32,
}

impl DbConfig {
    fn from_lookup(lookup: Lookup) -> SchoolResult<Self> {
        let get_env_var = |name| lookup(name).context(BadEnvVarSnafu { name });

        Ok(Self {
            user: get_env_var("DB_USER")?,
            password: SecretString::from(get_env_var("DB_PASSWORD")?),
            path: get_env_var("DB_PATH")?,
            port: get_env_var("DB_PORT")?.parse().context(ParsePortSnafu)?,
            database: get_env_var("DB_NAME")?,
            max_connections: match optional_var(lookup, "DB_MAX_CONNECTIONS")? {
                Some(max) => max.parse().context(ParseMaxConnectionsSnafu)?,
                None => DEFAULT_MAX_CONNECTIONS,
            },
        })
    }

    pub const fn max_connections(&self) -> u32 {
        self.max_connections
    }

    pub fn get_db_path(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user,
            self.password.expose_secret(),
            self.path,
            self.port,
            self.database
        )
    }
}

fn optional_var(lookup: Lookup, name: &'static str) -> SchoolResult<Option<String>> {
    match lookup(name) {
        Ok(value) => Ok(Some(value)),
        Err(dotenvy::Error::EnvVar(VarError::NotPresent)) => Ok(None),
        Err(source) => Err(source).context(BadEnvVarSnafu { name }),
    }
}
