//! HTTP-facing error type.
//!
//! Every failure leaves the service as `{"success": false, "message": ...}`
//! with a status code picked from the variant. Storage and I/O details are
//! logged and replaced by a generic message before they reach the client.

use crate::spreadsheet::SpreadsheetError;
use crate::store::StoreError;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use common::responses::MessageResponse;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Spreadsheet(#[from] SpreadsheetError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Spreadsheet(SpreadsheetError::UnknownToken) => StatusCode::NOT_FOUND,
            ApiError::Spreadsheet(SpreadsheetError::TooLarge(_)) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Spreadsheet(SpreadsheetError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Spreadsheet(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(_) | ApiError::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ApiError::Store(e) => {
                log::error!("storage failure: {}", e);
                "Storage failure".to_string()
            }
            ApiError::Spreadsheet(SpreadsheetError::Io(e)) => {
                log::error!("upload i/o failure: {}", e);
                "Could not access the uploaded file".to_string()
            }
            ApiError::Join(e) => {
                log::error!("{}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(MessageResponse::failure(message))
    }
}

/// Runs store or file work on the blocking pool so actix workers stay free.
pub async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

/// JSON body extractor settings: size cap plus errors in the service's shape.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| ApiError::BadRequest(format!("Invalid request body: {}", err)).into())
}

/// The only path parameter is a lead id.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|_err, _req| ApiError::BadRequest("Invalid lead ID".to_string()).into())
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(format!("Invalid query: {}", err)).into())
}
