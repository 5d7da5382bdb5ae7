//! Shared application state.
//!
//! `AppState` is built once in `main.rs` from the loaded `Settings` and handed
//! to every worker as `web::Data`. It only holds handles (a database path and
//! an upload directory), so cloning it into blocking tasks is cheap.

use crate::config::Settings;
use crate::spreadsheet::uploads::UploadDir;
use crate::store::{LeadStore, StoreError};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("could not open lead database: {0}")]
    Store(#[from] StoreError),
    #[error("could not create upload directory {path}: {source}")]
    UploadDir { path: PathBuf, source: io::Error },
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub store: LeadStore,
    /// Spreadsheets waiting between upload and preview.
    pub uploads: UploadDir,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn from_settings(settings: &Settings) -> Result<Self, StartupError> {
        let store = LeadStore::open(&settings.database_path)?;
        let uploads =
            UploadDir::open(&settings.upload_dir).map_err(|source| StartupError::UploadDir {
                path: settings.upload_dir.clone(),
                source,
            })?;
        Ok(AppState {
            store,
            uploads,
            max_upload_bytes: settings.max_upload_bytes,
        })
    }
}
