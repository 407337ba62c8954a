//! Access service: the entry point request handlers call.

use std::collections::HashSet;

use filigate_core::models::branch::Branch;
use filigate_core::models::tenant::Tenant;
use filigate_core::repository::{
    BranchGrantRepository, BranchRepository, ProfileRepository, TenantGrantRepository,
    TenantRepository,
};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::config::AccessConfig;
use crate::error::AccessError;
use crate::evaluator::AccessBasis;
use crate::gate::SchemaGate;
use crate::merge::{BranchFilter, RequestedBranches, merge_scope};
use crate::scope::{AllowedBranches, BranchScopeResolver};

/// Everything a data-serving request needs after authorization.
#[derive(Debug, Clone, Serialize)]
pub struct QueryScope {
    /// The tenant the gate checked. Query this one and no other.
    pub tenant: Tenant,
    pub basis: AccessBasis,
    pub filter: BranchFilter,
}

/// Access service.
///
/// Generic over repository implementations so that the access layer
/// has no dependency on the database crate.
pub struct AccessService<P, T, G, B, BG>
where
    P: ProfileRepository,
    T: TenantRepository,
    G: TenantGrantRepository,
    B: BranchRepository,
    BG: BranchGrantRepository,
{
    gate: SchemaGate<P, T, G>,
    scope: BranchScopeResolver<BG>,
    branches: B,
    config: AccessConfig,
}

impl<P, T, G, B, BG> AccessService<P, T, G, B, BG>
where
    P: ProfileRepository,
    T: TenantRepository,
    G: TenantGrantRepository,
    B: BranchRepository,
    BG: BranchGrantRepository,
{
    pub fn new(
        profiles: P,
        tenants: T,
        tenant_grants: G,
        branches: B,
        branch_grants: BG,
        config: AccessConfig,
    ) -> Self {
        Self {
            gate: SchemaGate::new(profiles, tenants, tenant_grants),
            scope: BranchScopeResolver::new(branch_grants),
            branches,
            config,
        }
    }

    pub fn gate(&self) -> &SchemaGate<P, T, G> {
        &self.gate
    }

    pub fn branches(&self) -> &B {
        &self.branches
    }

    pub fn branch_grants(&self) -> &BG {
        self.scope.grants()
    }

    pub fn config(&self) -> &AccessConfig {
        &self.config
    }

    pub async fn can_access_schema(
        &self,
        identity_id: Uuid,
        schema: &str,
    ) -> Result<bool, AccessError> {
        self.gate.can_access_schema(identity_id, schema).await
    }

    /// Branch scope for `identity_id` in `tenant_id`. Missing and inactive
    /// profiles are denied.
    pub async fn resolve_allowed_branches(
        &self,
        identity_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<AllowedBranches, AccessError> {
        let profile = self.gate.identities().resolve_profile(identity_id).await?;
        self.scope
            .resolve_allowed_branches(&profile, tenant_id)
            .await
    }

    /// Parse a raw request filter with this service's limits.
    pub fn parse_requested(&self, raw: Option<&str>) -> RequestedBranches {
        RequestedBranches::parse(raw, &self.config)
    }

    /// Gate, branch scope and merge in one call.
    ///
    /// The returned tenant is the one the gate resolved from `schema`.
    pub async fn authorize_query(
        &self,
        identity_id: Uuid,
        schema: &str,
        requested: &RequestedBranches,
    ) -> Result<QueryScope, AccessError> {
        let pass = self.gate.authorize(identity_id, schema).await?;
        let allowed = self
            .scope
            .resolve_allowed_branches(&pass.profile, pass.tenant.id)
            .await?;
        let filter = merge_scope(&allowed, requested);

        debug!(
            %identity_id,
            tenant_id = %pass.tenant.id,
            unfiltered = matches!(filter, BranchFilter::Unfiltered),
            branches = filter.codes().map(|c| c.len()),
            "query scope resolved"
        );

        Ok(QueryScope {
            tenant: pass.tenant,
            basis: pass.basis,
            filter,
        })
    }

    /// Active tenants the identity can switch to, ordered by name.
    pub async fn list_accessible_tenants(
        &self,
        identity_id: Uuid,
    ) -> Result<Vec<Tenant>, AccessError> {
        let profile = self.gate.identities().resolve_profile(identity_id).await?;
        let active = self.gate.directory().active_tenants().await?;

        if profile.is_superadmin() {
            return Ok(active);
        }

        let mut reachable: HashSet<Uuid> = self
            .gate
            .evaluator()
            .grants()
            .list_for_user(profile.id)
            .await?
            .into_iter()
            .map(|g| g.tenant_id)
            .collect();
        reachable.extend(profile.tenant_id);

        Ok(active
            .into_iter()
            .filter(|t| reachable.contains(&t.id))
            .collect())
    }

    /// Branches of `tenant_id` the identity may see, ordered by code.
    pub async fn list_visible_branches(
        &self,
        identity_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Vec<Branch>, AccessError> {
        let pass = self.gate.authorize_tenant(identity_id, tenant_id).await?;
        let allowed = self
            .scope
            .resolve_allowed_branches(&pass.profile, tenant_id)
            .await?;
        let branches = self.branches.list_by_tenant(tenant_id).await?;

        Ok(branches
            .into_iter()
            .filter(|b| allowed.permits(&b.branch_code))
            .collect())
    }
}
