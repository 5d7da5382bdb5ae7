//! # Lead Store
//!
//! SQLite persistence for leads. The store only remembers the database path;
//! every operation opens its own connection, so a `LeadStore` is cheap to
//! clone into handlers and blocking tasks.
//!
//! The `leads` table carries UNIQUE constraints on `mobile_number` and
//! `lead_id`. Violations come back as [`StoreError::DuplicateMobileNumber`]
//! and [`StoreError::DuplicateLeadId`] so callers can react to them instead of
//! relying on a prior lookup.

pub mod lead_id;

use chrono::{Local, NaiveDate};
use common::model::field::LeadStatus;
use common::model::lead::Lead;
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension, Row};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS leads (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    lead_id          TEXT NOT NULL UNIQUE,
    customer_name    TEXT NOT NULL,
    mobile_number    TEXT NOT NULL UNIQUE,
    enquiry_for      TEXT NOT NULL,
    status           TEXT NOT NULL DEFAULT 'pending'
                     CHECK (status IN ('pending', 'approved', 'rejected')),
    rejection_reason TEXT,
    agent_id         TEXT,
    agent_name       TEXT,
    created_date     TEXT NOT NULL,
    updated_date     TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_leads_updated_date ON leads (updated_date);
CREATE INDEX IF NOT EXISTS idx_leads_created_date ON leads (created_date);
";

const COLUMNS: &str = "id, lead_id, customer_name, mobile_number, enquiry_for, status, \
                       rejection_reason, agent_id, agent_name, created_date, updated_date";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("mobile_number {0} already belongs to another lead")]
    DuplicateMobileNumber(String),
    #[error("lead id {0} is already taken")]
    DuplicateLeadId(String),
    #[error("every lead id starting with {0} is taken")]
    LeadIdsExhausted(String),
}

/// The mutable part of a lead: everything except its keys and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadFields {
    pub customer_name: String,
    pub mobile_number: String,
    pub enquiry_for: String,
    pub status: LeadStatus,
    pub rejection_reason: Option<String>,
    pub agent_id: Option<String>,
    pub agent_name: Option<String>,
}

impl From<&Lead> for LeadFields {
    fn from(lead: &Lead) -> Self {
        LeadFields {
            customer_name: lead.customer_name.clone(),
            mobile_number: lead.mobile_number.clone(),
            enquiry_for: lead.enquiry_for.clone(),
            status: lead.status,
            rejection_reason: lead.rejection_reason.clone(),
            agent_id: lead.agent_id.clone(),
            agent_name: lead.agent_name.clone(),
        }
    }
}

/// Filters for [`LeadStore::list`]; all set filters must match.
#[derive(Debug, Clone, Default)]
pub struct LeadFilter {
    pub status: Option<String>,
    pub enquiry_for: Option<String>,
    /// Substring of the agent name.
    pub agent_name: Option<String>,
    /// Created on or after the start of this day.
    pub created_from: Option<NaiveDate>,
    /// Created on or before the end of this day.
    pub created_to: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct LeadStore {
    db_path: PathBuf,
}

impl LeadStore {
    /// Opens (creating if needed) the database and makes sure the schema exists.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = LeadStore {
            db_path: db_path.into(),
        };
        let conn = store.connect()?;
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get::<_, String>(0))?;
        conn.execute_batch(SCHEMA)?;
        Ok(store)
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.db_path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Leads matching `filter`, most recently updated first.
    pub fn list(&self, filter: &LeadFilter) -> Result<Vec<Lead>, StoreError> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(status) = &filter.status {
            clauses.push("status = ?");
            values.push(status.clone());
        }
        if let Some(enquiry_for) = &filter.enquiry_for {
            clauses.push("enquiry_for = ?");
            values.push(enquiry_for.clone());
        }
        if let Some(agent_name) = &filter.agent_name {
            clauses.push("agent_name LIKE ? ESCAPE '\\'");
            values.push(format!("%{}%", escape_like(agent_name)));
        }
        if let Some(from) = filter.created_from {
            clauses.push("created_date >= ?");
            values.push(format!("{} 00:00:00", from.format("%Y-%m-%d")));
        }
        if let Some(to) = filter.created_to {
            clauses.push("created_date <= ?");
            values.push(format!("{} 23:59:59", to.format("%Y-%m-%d")));
        }

        let mut sql = format!("SELECT {COLUMNS} FROM leads");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY updated_date DESC, id DESC");

        let conn = self.connect()?;
        let mut stmt = conn.prepare(&sql)?;
        let leads = stmt
            .query_map(params_from_iter(values.iter()), lead_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(leads)
    }

    pub fn get(&self, id: i64) -> Result<Option<Lead>, StoreError> {
        let conn = self.connect()?;
        let lead = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM leads WHERE id = ?1"),
                params![id],
                lead_from_row,
            )
            .optional()?;
        Ok(lead)
    }

    pub fn find_by_mobile(&self, mobile_number: &str) -> Result<Option<Lead>, StoreError> {
        let conn = self.connect()?;
        let lead = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM leads WHERE mobile_number = ?1"),
                params![mobile_number],
                lead_from_row,
            )
            .optional()?;
        Ok(lead)
    }

    /// The subset of `mobile_numbers` already owned by some lead.
    pub fn mobile_numbers_in_use<'a, I>(&self, mobile_numbers: I) -> Result<HashSet<String>, StoreError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT 1 FROM leads WHERE mobile_number = ?1")?;
        let mut in_use = HashSet::new();
        for number in mobile_numbers {
            if !in_use.contains(number) && stmt.exists(params![number])? {
                in_use.insert(number.to_string());
            }
        }
        Ok(in_use)
    }

    /// Every stored `lead_id` that starts with `prefix`.
    pub fn lead_ids_with_prefix(&self, prefix: &str) -> Result<HashSet<String>, StoreError> {
        let conn = self.connect()?;
        let mut stmt =
            conn.prepare("SELECT lead_id FROM leads WHERE substr(lead_id, 1, length(?1)) = ?1")?;
        let ids = stmt
            .query_map(params![prefix], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(ids)
    }

    pub fn insert(&self, lead_id: &str, fields: &LeadFields) -> Result<Lead, StoreError> {
        let conn = self.connect()?;
        let now = timestamp_now();
        conn.execute(
            "INSERT INTO leads (lead_id, customer_name, mobile_number, enquiry_for, status,
                                rejection_reason, agent_id, agent_name, created_date, updated_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            params![
                lead_id,
                fields.customer_name,
                fields.mobile_number,
                fields.enquiry_for,
                fields.status.as_str(),
                fields.rejection_reason,
                fields.agent_id,
                fields.agent_name,
                now,
            ],
        )
        .map_err(|e| constraint_error(e, fields, Some(lead_id)))?;

        Ok(Lead {
            id: conn.last_insert_rowid(),
            lead_id: lead_id.to_string(),
            customer_name: fields.customer_name.clone(),
            mobile_number: fields.mobile_number.clone(),
            enquiry_for: fields.enquiry_for.clone(),
            status: fields.status,
            rejection_reason: fields.rejection_reason.clone(),
            agent_id: fields.agent_id.clone(),
            agent_name: fields.agent_name.clone(),
            created_date: now.clone(),
            updated_date: now,
        })
    }

    /// Overwrites every mutable field of lead `id` and bumps `updated_date`.
    /// Returns `None` when the lead does not exist.
    pub fn update(&self, id: i64, fields: &LeadFields) -> Result<Option<Lead>, StoreError> {
        let conn = self.connect()?;
        let changed = conn
            .execute(
                "UPDATE leads SET customer_name = ?1, mobile_number = ?2, enquiry_for = ?3,
                                  status = ?4, rejection_reason = ?5, agent_id = ?6,
                                  agent_name = ?7, updated_date = ?8
                 WHERE id = ?9",
                params![
                    fields.customer_name,
                    fields.mobile_number,
                    fields.enquiry_for,
                    fields.status.as_str(),
                    fields.rejection_reason,
                    fields.agent_id,
                    fields.agent_name,
                    timestamp_now(),
                    id,
                ],
            )
            .map_err(|e| constraint_error(e, fields, None))?;
        if changed == 0 {
            return Ok(None);
        }
        drop(conn);
        self.get(id)
    }

    /// Returns whether a lead was removed.
    pub fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let conn = self.connect()?;
        let removed = conn.execute("DELETE FROM leads WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM leads", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    #[cfg(test)]
    pub(crate) fn set_timestamps(&self, id: i64, created: &str, updated: &str) -> Result<(), StoreError> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE leads SET created_date = ?1, updated_date = ?2 WHERE id = ?3",
            params![created, updated, id],
        )?;
        Ok(())
    }
}

fn timestamp_now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn lead_from_row(row: &Row<'_>) -> rusqlite::Result<Lead> {
    let status: String = row.get(5)?;
    let status = status
        .parse::<LeadStatus>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;
    Ok(Lead {
        id: row.get(0)?,
        lead_id: row.get(1)?,
        customer_name: row.get(2)?,
        mobile_number: row.get(3)?,
        enquiry_for: row.get(4)?,
        status,
        rejection_reason: row.get(6)?,
        agent_id: row.get(7)?,
        agent_name: row.get(8)?,
        created_date: row.get(9)?,
        updated_date: row.get(10)?,
    })
}

fn constraint_error(err: rusqlite::Error, fields: &LeadFields, lead_id: Option<&str>) -> StoreError {
    if let rusqlite::Error::SqliteFailure(failure, Some(message)) = &err {
        if failure.code == ErrorCode::ConstraintViolation {
            if message.contains("leads.mobile_number") {
                return StoreError::DuplicateMobileNumber(fields.mobile_number.clone());
            }
            if let Some(lead_id) = lead_id.filter(|_| message.contains("leads.lead_id")) {
                return StoreError::DuplicateLeadId(lead_id.to_string());
            }
        }
    }
    StoreError::Sqlite(err)
}
