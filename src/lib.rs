//! Record keeping for a school guidance counsellor's office.
//!
//! Students, groups, psychological tests and reports live in collections
//! that mirror themselves into a per-workspace key/value store. The
//! `orientd` binary exposes them over a JSON-lines protocol on stdin/stdout.

pub mod autosave;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod ipc;
pub mod model;
pub mod office;
pub mod roster;
pub mod snapshot;
pub mod storage;
pub mod store;
pub mod students;
pub mod validation;
