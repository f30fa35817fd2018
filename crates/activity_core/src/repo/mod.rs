//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the storage contract the activity store depends on.
//! - Isolate SQLite query details from use-case orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `Duplicate`) in
//!   addition to DB transport errors.

pub mod activity_repo;
