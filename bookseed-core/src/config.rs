use std::fmt;
use std::path::{Path, PathBuf};

use sqlx::mysql::MySqlConnectOptions;
use tracing::{debug, info};

use crate::error::{ProvisionError, Result};

pub const DB_USER: &str = "DB_USER";
pub const DB_PASSWORD: &str = "DB_PASSWORD";
pub const DB_HOST: &str = "DB_HOST";
pub const DB_PORT: &str = "DB_PORT";
pub const DB_NAME: &str = "DB_NAME";

/// Load environment variables from a `.env` file.
///
/// With no explicit path, the nearest `.env` in the current directory or
/// its ancestors is loaded if one exists; finding none is not an error.
/// An explicit path must exist. Variables already set in the process
/// environment are never overwritten.
pub fn load_dotenv(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    match explicit {
        Some(path) => {
            dotenvy::from_path(path).map_err(|source| ProvisionError::EnvFile {
                path: path.to_path_buf(),
                source,
            })?;
            info!("Loaded configuration from {}", path.display());
            Ok(Some(path.to_path_buf()))
        }
        None => match dotenvy::dotenv() {
            Ok(path) => {
                info!("Loaded configuration from {}", path.display());
                Ok(Some(path))
            }
            Err(e) => {
                debug!("No .env loaded: {}", e);
                info!("Using environment variables only (no .env file found)");
                Ok(None)
            }
        },
    }
}

/// Connection parameters for the target MySQL database.
///
/// All five `DB_*` variables are required; there are no defaults.
#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,
}

impl DbConfig {
    /// Read `DB_USER`, `DB_PASSWORD`, `DB_HOST`, `DB_PORT` and `DB_NAME`
    /// from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &'static str| lookup(name).ok_or(ProvisionError::MissingVar { name });

        let user = require(DB_USER)?;
        let password = require(DB_PASSWORD)?;
        let host = require(DB_HOST)?;
        let raw_port = require(DB_PORT)?;
        let database = require(DB_NAME)?;

        let port = raw_port
            .trim()
            .parse::<u16>()
            .map_err(|_| ProvisionError::InvalidPort { value: raw_port })?;

        Ok(Self {
            user,
            password,
            host,
            port,
            database,
        })
    }

    /// Connection options for sqlx. Credentials are passed as fields so
    /// they never need URL escaping.
    pub fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }

    /// Connection string with the password masked, for logs and errors.
    pub fn redacted_url(&self) -> String {
        format!(
            "mysql://{}:***@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("user", &self.user)
            .field("password", &"***")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .finish()
    }
}

impl fmt::Display for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted_url())
    }
}
