//! Application use cases

pub mod audit_service;

pub use audit_service::{
    audit_image, build_analyzer, resolve_detection_source, AuditOptions, AuditServiceError,
    Auditor,
};
