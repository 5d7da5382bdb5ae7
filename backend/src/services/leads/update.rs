//! `PUT /leads/{id}`: partial edit of a single lead.
//!
//! The body may carry any subset of the seven mutable fields. They are merged
//! over the stored lead, the result is checked, and the whole field set is
//! written back. A mobile number already owned by another lead is refused with
//! 409, whether the pre-check spots it or the UNIQUE constraint does.

use crate::error::{run_blocking, ApiError};
use crate::state::AppState;
use crate::store::{LeadFields, LeadStore, StoreError};
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::model::field::LeadStatus;
use common::model::lead::Lead;
use common::requests::UpdateLeadRequest;
use common::responses::LeadResponse;

const MOBILE_TAKEN: &str =
    "mobile_number must be unique. This number already exists for another lead.";
const REASON_REQUIRED: &str = "rejection_reason is required when status is rejected";

pub(crate) async fn process(
    state: web::Data<AppState>,
    id: web::Path<i64>,
    payload: web::Json<UpdateLeadRequest>,
) -> impl Responder {
    let state = state.get_ref().clone();
    let (id, changes) = (id.into_inner(), payload.into_inner());
    match run_blocking(move || update_lead(&state.store, id, changes)).await {
        Ok(lead) => HttpResponse::Ok().json(LeadResponse {
            success: true,
            message: "Lead updated successfully".to_string(),
            data: lead,
        }),
        Err(e) => e.error_response(),
    }
}

fn update_lead(store: &LeadStore, id: i64, changes: UpdateLeadRequest) -> Result<Lead, ApiError> {
    let lead = store
        .get(id)?
        .ok_or_else(|| ApiError::NotFound("Lead not found".to_string()))?;

    if changes.is_empty() {
        return Err(ApiError::BadRequest(
            "No valid fields provided for update".to_string(),
        ));
    }
    let fields = apply_changes(&lead, changes)?;

    if let Some(owner) = store.find_by_mobile(&fields.mobile_number)? {
        if owner.id != id {
            return Err(ApiError::Conflict(MOBILE_TAKEN.to_string()));
        }
    }

    match store.update(id, &fields) {
        Ok(Some(updated)) => {
            log::info!("updated lead {} ({})", updated.id, updated.lead_id);
            Ok(updated)
        }
        Ok(None) => Err(ApiError::NotFound("Lead not found".to_string())),
        Err(StoreError::DuplicateMobileNumber(_)) => Err(ApiError::Conflict(MOBILE_TAKEN.to_string())),
        Err(e) => Err(e.into()),
    }
}

/// Merges the supplied fields over `lead`.
fn apply_changes(lead: &Lead, changes: UpdateLeadRequest) -> Result<LeadFields, ApiError> {
    let mut fields = LeadFields::from(lead);

    for (name, value, slot) in [
        ("customer_name", changes.customer_name, &mut fields.customer_name),
        ("mobile_number", changes.mobile_number, &mut fields.mobile_number),
        ("enquiry_for", changes.enquiry_for, &mut fields.enquiry_for),
    ] {
        if let Some(value) = value {
            let value = value.trim();
            if value.is_empty() {
                return Err(ApiError::BadRequest(format!("{} cannot be empty", name)));
            }
            *slot = value.to_string();
        }
    }

    let requested_status = match changes.status {
        Some(raw) => Some(raw.parse::<LeadStatus>().map_err(|_| {
            ApiError::BadRequest("Invalid status. Allowed: pending, approved, rejected".to_string())
        })?),
        None => None,
    };
    if let Some(status) = requested_status {
        fields.status = status;
    }

    let reason = changes.rejection_reason.map(|r| r.trim().to_string());
    if requested_status == Some(LeadStatus::Rejected) && reason.as_deref().is_none_or(str::is_empty) {
        return Err(ApiError::BadRequest(REASON_REQUIRED.to_string()));
    }
    match reason {
        Some(r) if r.is_empty() => {
            if fields.status == LeadStatus::Rejected {
                return Err(ApiError::BadRequest(REASON_REQUIRED.to_string()));
            }
            fields.rejection_reason = None;
        }
        Some(r) => fields.rejection_reason = Some(r),
        None => {}
    }

    if let Some(agent_id) = changes.agent_id {
        fields.agent_id = optional_text(agent_id);
    }
    if let Some(agent_name) = changes.agent_name {
        fields.agent_name = optional_text(agent_name);
    }
    Ok(fields)
}

fn optional_text(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
