use crate::error::{run_blocking, ApiError};
use crate::import::mapping::build_preview;
use crate::spreadsheet::read_sheet;
use crate::state::AppState;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::requests::PreviewRequest;
use common::responses::PreviewResponse;

/// Handler for `POST /leads/preview`: re-reads the uploaded file named by
/// `fileToken` and returns every row mapped, validated and duplicate-checked.
pub(crate) async fn process(
    state: web::Data<AppState>,
    payload: web::Json<PreviewRequest>,
) -> impl Responder {
    match preview(state.get_ref().clone(), payload.into_inner()).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => e.error_response(),
    }
}

async fn preview(state: AppState, request: PreviewRequest) -> Result<PreviewResponse, ApiError> {
    let token = request.file_token.trim().to_string();
    let path = state.uploads.resolve(&token)?;

    let response = run_blocking(move || -> Result<PreviewResponse, ApiError> {
        let sheet = read_sheet(&path)?;
        if sheet.is_empty() {
            return Err(ApiError::BadRequest("File appears to be empty.".to_string()));
        }
        Ok(build_preview(&sheet, &request.mapping, &state.store)?)
    })
    .await?;

    log::info!(
        "preview of {}: {} rows, {} with errors, {} duplicates",
        token,
        response.preview.len(),
        response.errors.len(),
        response.preview.iter().filter(|r| r.duplicate).count()
    );
    Ok(response)
}
