use crate::error::ApiError;
use crate::import::commit::commit_rows;
use crate::state::AppState;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::requests::UploadFinalRequest;
use common::responses::{ImportSummary, UploadFinalResponse};

/// Handler for `POST /leads/upload-final`: commits the rows the user kept and
/// reports how many were inserted, updated or refused.
pub(crate) async fn process(
    state: web::Data<AppState>,
    payload: web::Json<UploadFinalRequest>,
) -> impl Responder {
    match commit(state.get_ref().clone(), payload.into_inner()).await {
        Ok(summary) => HttpResponse::Ok().json(UploadFinalResponse {
            success: true,
            summary,
        }),
        Err(e) => e.error_response(),
    }
}

async fn commit(state: AppState, request: UploadFinalRequest) -> Result<ImportSummary, ApiError> {
    let summary =
        tokio::task::spawn_blocking(move || commit_rows(&state.store, &request.rows)).await?;
    log::info!(
        "import committed: {} rows, {} inserted, {} updated, {} refused",
        summary.total,
        summary.inserted,
        summary.updated,
        summary.errors
    );
    Ok(summary)
}
