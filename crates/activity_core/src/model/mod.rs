//! Domain model for logged activities.
//!
//! # Responsibility
//! - Define the activity record, its identity pair and request shapes.
//!
//! # Invariants
//! - Every activity is identified by its normalized `(activity_date, start_time)`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod activity;
