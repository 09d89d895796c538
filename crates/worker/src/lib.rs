//! Background worker for incremental embedding generation.
//!
//! The [`scheduler`] wakes on a configurable naptime, lists enabled
//! jobs from the registry, and runs each through the [`executor`],
//! which processes one bounded batch per job per cycle under a
//! per-job transaction.

pub mod executor;
pub mod scheduler;
