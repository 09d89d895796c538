//! Shared domain types for the gembed embedding worker.
//!
//! This crate has no database or network dependencies so it can be
//! used from the repository layer, the worker, and any future CLI
//! tooling alike.

pub mod config;
pub mod error;
pub mod ident;
pub mod job_status;
pub mod types;
