//! Schema access gate.
//!
//! The single choke point in front of tenant-scoped data. It resolves the
//! schema to a tenant and evaluates access against that same tenant, and
//! hands the tenant back so the caller queries exactly what was checked.
//! Lookups by tenant id go through the same checks.

use filigate_core::models::profile::Profile;
use filigate_core::models::tenant::Tenant;
use filigate_core::repository::{ProfileRepository, TenantGrantRepository, TenantRepository};
use tracing::trace;
use uuid::Uuid;

use crate::directory::{IdentityResolver, TenantDirectory, parse_schema};
use crate::error::{AccessError, denied};
use crate::evaluator::{AccessBasis, TenantAccessEvaluator};

/// Proof that a caller passed the gate for one tenant.
#[derive(Debug, Clone)]
pub struct GatePass {
    pub profile: Profile,
    pub tenant: Tenant,
    pub basis: AccessBasis,
}

pub struct SchemaGate<P, T, G>
where
    P: ProfileRepository,
    T: TenantRepository,
    G: TenantGrantRepository,
{
    identities: IdentityResolver<P>,
    directory: TenantDirectory<T>,
    evaluator: TenantAccessEvaluator<G>,
}

impl<P, T, G> SchemaGate<P, T, G>
where
    P: ProfileRepository,
    T: TenantRepository,
    G: TenantGrantRepository,
{
    pub fn new(profiles: P, tenants: T, tenant_grants: G) -> Self {
        Self {
            identities: IdentityResolver::new(profiles),
            directory: TenantDirectory::new(tenants),
            evaluator: TenantAccessEvaluator::new(tenant_grants),
        }
    }

    pub fn identities(&self) -> &IdentityResolver<P> {
        &self.identities
    }

    pub fn directory(&self) -> &TenantDirectory<T> {
        &self.directory
    }

    pub fn evaluator(&self) -> &TenantAccessEvaluator<G> {
        &self.evaluator
    }

    /// Admit `identity_id` to `raw_schema` or refuse.
    ///
    /// Order: schema syntax, profile, active tenant, decision table.
    pub async fn authorize(
        &self,
        identity_id: Uuid,
        raw_schema: &str,
    ) -> Result<GatePass, AccessError> {
        // Syntax first: a malformed name must not trigger any lookup.
        let Some(schema) = parse_schema(raw_schema) else {
            return Err(denied(identity_id, "schema_malformed"));
        };
        let profile = self.identities.resolve_profile(identity_id).await?;
        let tenant = self.directory.find_tenant_by_schema(&schema).await?;
        self.admit(profile, tenant).await
    }

    /// Same checks as [`authorize`](Self::authorize), for callers that
    /// already hold a tenant id instead of a schema name.
    pub async fn authorize_tenant(
        &self,
        identity_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<GatePass, AccessError> {
        let profile = self.identities.resolve_profile(identity_id).await?;
        let tenant = self.directory.find_tenant_by_id(tenant_id).await?;
        self.admit(profile, tenant).await
    }

    async fn admit(
        &self,
        profile: Profile,
        tenant: Option<Tenant>,
    ) -> Result<GatePass, AccessError> {
        let tenant = match tenant {
            Some(tenant) if tenant.is_active => tenant,
            Some(_) => return Err(denied(profile.id, "tenant_inactive")),
            None => return Err(denied(profile.id, "tenant_unknown")),
        };

        let basis = match self.evaluator.evaluate(&profile, tenant.id).await? {
            Some(basis) => basis,
            None => return Err(denied(profile.id, "tenant_not_accessible")),
        };

        trace!(
            identity_id = %profile.id,
            tenant_id = %tenant.id,
            schema = %tenant.schema_name,
            ?basis,
            "tenant access granted"
        );

        Ok(GatePass {
            profile,
            tenant,
            basis,
        })
    }

    /// Boolean form of [`authorize`](Self::authorize). Store failures are
    /// still returned as errors rather than folded into `false`.
    pub async fn can_access_schema(
        &self,
        identity_id: Uuid,
        raw_schema: &str,
    ) -> Result<bool, AccessError> {
        match self.authorize(identity_id, raw_schema).await {
            Ok(_) => Ok(true),
            Err(AccessError::Denied) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
