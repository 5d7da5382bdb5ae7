//! The spreadsheet import pipeline behind `/leads/preview` and
//! `/leads/upload-final`.
//!
//! - `mapping`: maps raw sheet rows onto system fields and validates them.
//! - `commit`: upserts the approved rows into the lead store.

pub mod commit;
pub mod mapping;
