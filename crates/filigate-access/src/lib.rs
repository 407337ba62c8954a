//! Tenant, schema and branch-scope access decisions.
//!
//! Every data-serving request goes through [`AccessService::authorize_query`]
//! (or at least [`SchemaGate::authorize`]) before touching tenant data. The
//! crate is generic over the repository traits in `filigate-core` and has
//! no dependency on a concrete store.

pub mod admin;
pub mod config;
pub mod directory;
pub mod error;
pub mod evaluator;
pub mod gate;
pub mod merge;
pub mod scope;
pub mod service;

pub use admin::GrantAdmin;
pub use config::AccessConfig;
pub use error::AccessError;
pub use evaluator::{AccessBasis, TenantAccessEvaluator};
pub use gate::{GatePass, SchemaGate};
pub use merge::{BranchFilter, RequestedBranches, merge_scope};
pub use scope::{AllowedBranches, BranchScopeResolver};
pub use service::{AccessService, QueryScope};
