//! Domain layer - standards reference data and report services

pub mod model;
pub mod service;
