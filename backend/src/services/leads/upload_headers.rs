use crate::error::ApiError;
use crate::spreadsheet::{read_sheet, SpreadsheetError};
use crate::state::AppState;
use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::model::field::SystemField;
use common::responses::UploadHeadersResponse;
use futures_util::StreamExt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// HTTP handler for `POST /leads/upload-headers`.
///
/// - On success: `200 OK` with the sheet's column names, the mappable system
///   fields and the `fileToken` naming the stored upload.
/// - On failure: the error status with `{success: false, message}`.
pub(crate) async fn process(state: web::Data<AppState>, payload: Multipart) -> impl Responder {
    match receive_upload(&state, payload).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::warn!("upload rejected: {}", e);
            e.error_response()
        }
    }
}

/// Stores the multipart `file` part under a new token and reads its header
/// row. A file that turns out not to be a readable spreadsheet is removed
/// again.
async fn receive_upload(
    state: &AppState,
    mut payload: Multipart,
) -> Result<UploadHeadersResponse, ApiError> {
    let mut stored: Option<(String, PathBuf)> = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| ApiError::BadRequest(e.to_string()))?;
        let field_name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));
        if field_name.as_deref() != Some("file") {
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
            .unwrap_or_default();
        let (token, path) = state.uploads.reserve(&filename)?;

        if let Err(e) = write_field(&mut field, &path, state.max_upload_bytes).await {
            state.uploads.discard(&path);
            return Err(e);
        }
        stored = Some((token, path));
        break;
    }

    let (token, path) =
        stored.ok_or_else(|| ApiError::BadRequest("Invalid or missing file.".to_string()))?;

    let sheet_path = path.clone();
    let sheet = match tokio::task::spawn_blocking(move || read_sheet(&sheet_path)).await? {
        Ok(sheet) => sheet,
        Err(e) => {
            state.uploads.discard(&path);
            return Err(e.into());
        }
    };

    log::info!(
        "stored upload {} ({} columns, {} data rows)",
        token,
        sheet.headers.len(),
        sheet.rows.len()
    );
    Ok(UploadHeadersResponse {
        success: true,
        file_columns: sheet.headers,
        system_fields: SystemField::ALL.to_vec(),
        file_token: token,
    })
}

async fn write_field(field: &mut Field, path: &Path, limit: usize) -> Result<(), ApiError> {
    let file = File::create(path).map_err(SpreadsheetError::from)?;
    let mut writer = BufWriter::new(file);
    let mut written = 0usize;

    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| ApiError::BadRequest(e.to_string()))?;
        written += chunk.len();
        if written > limit {
            return Err(SpreadsheetError::TooLarge(limit).into());
        }
        writer.write_all(&chunk).map_err(SpreadsheetError::from)?;
    }
    writer.flush().map_err(SpreadsheetError::from)?;
    Ok(())
}
