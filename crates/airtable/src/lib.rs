//! Airtable REST v0 gateway.
//!
//! The process owns no project state: every command re-fetches from the two
//! Airtable tables (Projects, Employees) through this crate. Outbound calls
//! go through the [`transport::AirtableTransport`] seam so the pagination
//! loop and error mapping are testable without a live base.

pub mod client;
pub mod fixtures;
pub mod records;
pub mod repository;
pub mod transport;

pub use client::{AirtableClient, AirtableError};
pub use records::{Record, RecordPage};
pub use repository::{
    sort_by_target_date, AirtableEmployeeRepository, AirtableProjectRepository,
    EmployeeRepository, ProjectRepository,
};
