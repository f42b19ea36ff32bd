//! Domain model types

pub mod ada_code;

pub use ada_code::{all_codes, lookup, search, AdaCode};
