use crate::error::{run_blocking, ApiError};
use crate::state::AppState;
use crate::store::{LeadFilter, LeadStore};
use actix_web::{web, HttpResponse, Responder, ResponseError};
use chrono::NaiveDate;
use common::model::lead::Lead;
use common::requests::LeadListQuery;
use common::responses::LeadListResponse;

/// Handler for `GET /leads`.
pub(crate) async fn process(
    state: web::Data<AppState>,
    query: web::Query<LeadListQuery>,
) -> impl Responder {
    let state = state.get_ref().clone();
    let query = query.into_inner();
    match run_blocking(move || list_leads(&state.store, query)).await {
        Ok(leads) => HttpResponse::Ok().json(LeadListResponse {
            success: true,
            data: leads,
        }),
        Err(e) => e.error_response(),
    }
}

fn list_leads(store: &LeadStore, query: LeadListQuery) -> Result<Vec<Lead>, ApiError> {
    let filter = LeadFilter {
        status: non_blank(query.status),
        enquiry_for: non_blank(query.enquiry_for),
        agent_name: non_blank(query.agent_name),
        created_from: parse_day("date_from", query.date_from)?,
        created_to: parse_day("date_to", query.date_to)?,
    };
    Ok(store.list(&filter)?)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_day(name: &str, value: Option<String>) -> Result<Option<NaiveDate>, ApiError> {
    non_blank(value)
        .map(|v| {
            NaiveDate::parse_from_str(&v, "%Y-%m-%d")
                .map_err(|_| ApiError::BadRequest(format!("{} must be a date in YYYY-MM-DD form", name)))
        })
        .transpose()
}
