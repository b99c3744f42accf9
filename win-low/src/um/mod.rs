pub mod pdh;
pub mod winnt;
pub mod winperf;
