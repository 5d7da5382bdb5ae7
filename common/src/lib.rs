//! Contract types shared between the lead service and its clients.
//!
//! - `model`: leads, system fields and import candidate records.
//! - `requests`: typed request bodies and query strings, one per endpoint.
//! - `responses`: typed response bodies, one per endpoint.

pub mod model;
pub mod requests;
pub mod responses;
