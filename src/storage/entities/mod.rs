//! Database entities

pub mod call_log;
