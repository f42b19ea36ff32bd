//! Domain services

pub mod report;

pub use report::{generate_audit_report, SeveritySummary};
