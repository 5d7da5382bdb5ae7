//! Runtime settings for the lead service.
//!
//! Values come from the process environment, after an optional `.env` file in
//! the working directory has been loaded with `dotenvy`. Every setting has a
//! default suited to running the service locally.
//!
//! | variable                  | default          |
//! |---------------------------|------------------|
//! | `LEADS_HOST`              | `127.0.0.1`      |
//! | `LEADS_PORT`              | `8080`           |
//! | `LEADS_DATABASE`          | `leads.sqlite`   |
//! | `LEADS_UPLOAD_DIR`        | `uploads`        |
//! | `LEADS_MAX_UPLOAD_BYTES`  | `10485760`       |

use std::env;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATABASE: &str = "leads.sqlite";
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024; // 10 MB

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// SQLite database file holding the `leads` table.
    pub database_path: PathBuf,
    /// Directory where uploaded spreadsheets are kept under their file token.
    pub upload_dir: PathBuf,
    /// Cap for uploaded files and JSON bodies.
    pub max_upload_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database_path: PathBuf::from(DEFAULT_DATABASE),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is the normal case.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match non_empty("LEADS_PORT") {
            Some(raw) => parse_number("LEADS_PORT", &raw)?,
            None => defaults.port,
        };
        let max_upload_bytes = match non_empty("LEADS_MAX_UPLOAD_BYTES") {
            Some(raw) => parse_number("LEADS_MAX_UPLOAD_BYTES", &raw)?,
            None => defaults.max_upload_bytes,
        };

        Ok(Settings {
            host: non_empty("LEADS_HOST").unwrap_or(defaults.host),
            port,
            database_path: non_empty("LEADS_DATABASE")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            upload_dir: non_empty("LEADS_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_upload_bytes,
        })
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

fn parse_number<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        name,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
