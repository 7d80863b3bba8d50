//! Utility functions
//!
//! Pure helpers with no I/O: time formatting, identifier validation,
//! JSON reshaping, GPS distance and GUID generation. Safe to call from
//! any thread.

pub mod formatting;
pub mod geo;
pub mod guid;
pub mod reshape;
pub mod validation;
