//! Application service layer for ada-checker
//!
//! Configuration, detection sources, image scanning and the audit use case.

pub mod app;
pub mod config;
pub mod detector;
pub mod scanner;
