//! Flutter bridge crate for the activity tracker core.

pub mod api;
