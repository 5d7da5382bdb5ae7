//! Final step of an import: writes the rows the user approved.
//!
//! Rows are upserted one by one on their mobile number. Each row stands on its
//! own: a row that fails validation or storage is counted in `errors` and the
//! rest of the batch carries on, and nothing already written is rolled back.

use crate::import::mapping::{self, RowError};
use crate::store::lead_id::{free_lead_id, lead_id_for, lead_id_prefix};
use crate::store::{LeadFields, LeadStore, StoreError};
use chrono::{Local, NaiveDate};
use common::model::candidate::CandidateRecord;
use common::model::field::{LeadStatus, SystemField};
use common::responses::ImportSummary;
use rand::Rng;

/// Random lead id draws before falling back to the day's unused suffixes.
const RANDOM_LEAD_ID_DRAWS: usize = 5;
const LEAD_ID_ATTEMPTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Upsert {
    Inserted,
    Updated,
}

pub fn commit_rows(store: &LeadStore, rows: &[CandidateRecord]) -> ImportSummary {
    commit_rows_on(store, rows, Local::now().date_naive(), &mut rand::rng())
}

/// Commits `rows`, issuing lead ids for `today`.
fn commit_rows_on<R: Rng + ?Sized>(
    store: &LeadStore,
    rows: &[CandidateRecord],
    today: NaiveDate,
    rng: &mut R,
) -> ImportSummary {
    let mut summary = ImportSummary {
        total: rows.len(),
        ..Default::default()
    };

    for record in rows {
        let fields = match lead_fields(record) {
            Ok(fields) => fields,
            Err(errors) => {
                let reasons: Vec<String> = errors.iter().map(ToString::to_string).collect();
                log::warn!(
                    "skipping import row {}: {}",
                    record.row_index,
                    reasons.join(", ")
                );
                summary.errors += 1;
                continue;
            }
        };

        match upsert(store, &fields, today, rng) {
            Ok(Upsert::Inserted) => summary.inserted += 1,
            Ok(Upsert::Updated) => summary.updated += 1,
            Err(e) => {
                log::error!(
                    "failed to store import row {} ({}): {}",
                    record.row_index,
                    fields.mobile_number,
                    e
                );
                summary.errors += 1;
            }
        }
    }
    summary
}

/// Re-checks a submitted row and turns it into storable fields.
pub fn lead_fields(record: &CandidateRecord) -> Result<LeadFields, Vec<RowError>> {
    let mut record = record.clone();
    for field in SystemField::ALL {
        let value = record
            .value(field)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        record.set_value(field, value);
    }

    let errors = mapping::validate(&mut record);
    if !errors.is_empty() {
        return Err(errors);
    }

    let status = record
        .status
        .as_deref()
        .and_then(|s| s.parse::<LeadStatus>().ok())
        .unwrap_or_default();
    Ok(LeadFields {
        customer_name: record.customer_name.unwrap_or_default(),
        mobile_number: record.mobile_number.unwrap_or_default(),
        enquiry_for: record.enquiry_for.unwrap_or_default(),
        status,
        rejection_reason: record.rejection_reason,
        agent_id: record.agent_id,
        agent_name: record.agent_name,
    })
}

fn upsert<R: Rng + ?Sized>(
    store: &LeadStore,
    fields: &LeadFields,
    today: NaiveDate,
    rng: &mut R,
) -> Result<Upsert, StoreError> {
    match store.find_by_mobile(&fields.mobile_number)? {
        Some(existing) => update_existing(store, existing.id, fields),
        None => insert_new(store, fields, today, rng),
    }
}

/// Inserts `fields` under a fresh lead id. A few random ids are tried first,
/// then one of the ids still free for `today`. If the mobile number turns out
/// to be taken after all, the owning lead is updated instead.
fn insert_new<R: Rng + ?Sized>(
    store: &LeadStore,
    fields: &LeadFields,
    today: NaiveDate,
    rng: &mut R,
) -> Result<Upsert, StoreError> {
    let mut last_error = None;
    for attempt in 0..LEAD_ID_ATTEMPTS {
        let lead_id = if attempt < RANDOM_LEAD_ID_DRAWS {
            lead_id_for(today, rng)
        } else {
            let prefix = lead_id_prefix(today);
            let taken = store.lead_ids_with_prefix(&prefix)?;
            free_lead_id(today, &taken, rng).ok_or(StoreError::LeadIdsExhausted(prefix))?
        };

        match store.insert(&lead_id, fields) {
            Ok(_) => return Ok(Upsert::Inserted),
            Err(StoreError::DuplicateLeadId(taken)) => {
                log::debug!("lead id {} already taken, drawing another", taken);
                last_error = Some(StoreError::DuplicateLeadId(taken));
            }
            Err(StoreError::DuplicateMobileNumber(number)) => {
                // Inserted by a concurrent commit after our lookup.
                let existing = store
                    .find_by_mobile(&fields.mobile_number)?
                    .ok_or(StoreError::DuplicateMobileNumber(number))?;
                return update_existing(store, existing.id, fields);
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_error.unwrap_or_else(|| StoreError::LeadIdsExhausted(lead_id_prefix(today))))
}

fn update_existing(store: &LeadStore, id: i64, fields: &LeadFields) -> Result<Upsert, StoreError> {
    match store.update(id, fields)? {
        Some(_) => Ok(Upsert::Updated),
        None => Err(StoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows)),
    }
}
