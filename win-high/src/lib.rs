//! # Various Rusty wrappers for the Performance Data Helper (PDH) API
pub mod error;
pub mod format;
pub mod pdh;
pub mod prelude;
