//! SurrealDB repository implementations.

mod branch;
mod branch_grant;
mod profile;
mod tenant;
mod tenant_grant;

use surrealdb::{Connection, Surreal};

pub use branch::SurrealBranchRepository;
pub use branch_grant::SurrealBranchGrantRepository;
pub use profile::SurrealProfileRepository;
pub use tenant::SurrealTenantRepository;
pub use tenant_grant::SurrealTenantGrantRepository;

/// One handle per store, all sharing a single connection.
#[derive(Clone)]
pub struct Stores<C: Connection> {
    pub profiles: SurrealProfileRepository<C>,
    pub tenants: SurrealTenantRepository<C>,
    pub tenant_grants: SurrealTenantGrantRepository<C>,
    pub branches: SurrealBranchRepository<C>,
    pub branch_grants: SurrealBranchGrantRepository<C>,
}

impl<C: Connection> Stores<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self {
            profiles: SurrealProfileRepository::new(db.clone()),
            tenants: SurrealTenantRepository::new(db.clone()),
            tenant_grants: SurrealTenantGrantRepository::new(db.clone()),
            branches: SurrealBranchRepository::new(db.clone()),
            branch_grants: SurrealBranchGrantRepository::new(db),
        }
    }
}
