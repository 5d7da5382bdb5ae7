use crate::error::{run_blocking, ApiError};
use crate::state::AppState;
use crate::store::LeadStore;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::responses::MessageResponse;

/// Handler for `DELETE /leads/{id}`.
pub(crate) async fn process(state: web::Data<AppState>, id: web::Path<i64>) -> impl Responder {
    let id = id.into_inner();
    let state = state.get_ref().clone();
    match run_blocking(move || delete_lead(&state.store, id)).await {
        Ok(()) => {
            log::info!("deleted lead {}", id);
            HttpResponse::Ok().json(MessageResponse::ok("Lead deleted successfully"))
        }
        Err(e) => e.error_response(),
    }
}

fn delete_lead(store: &LeadStore, id: i64) -> Result<(), ApiError> {
    if store.delete(id)? {
        Ok(())
    } else {
        Err(ApiError::NotFound("Lead not found".to_string()))
    }
}
