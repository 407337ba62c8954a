//! filigate core: domain models, error types and store traits shared by
//! the storage and access-decision crates.

pub mod error;
pub mod models;
pub mod repository;
