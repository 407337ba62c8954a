//! Domain models for filigate.
//!
//! Profiles, tenants and grants are read-only from the point of view of
//! the access engine; they are written by administrative tooling.

pub mod branch;
pub mod grant;
pub mod profile;
pub mod tenant;
