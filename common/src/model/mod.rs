pub mod candidate;
pub mod field;
pub mod lead;
