//! Identity and tenant lookups.
//!
//! Pure lookups with no policy beyond "missing means denied": a profile or
//! tenant that cannot be found is never replaced by a default.

use filigate_core::error::FiligateError;
use filigate_core::models::profile::Profile;
use filigate_core::models::tenant::{SchemaName, Tenant};
use filigate_core::repository::{ProfileRepository, TenantRepository};
use tracing::debug;
use uuid::Uuid;

use crate::error::{AccessError, denied};

/// Maps an identity id to its [`Profile`].
pub struct IdentityResolver<P: ProfileRepository> {
    profiles: P,
}

impl<P: ProfileRepository> IdentityResolver<P> {
    pub fn new(profiles: P) -> Self {
        Self { profiles }
    }

    /// Resolve the profile for `identity_id`.
    ///
    /// Missing and deactivated profiles are both refused.
    pub async fn resolve_profile(&self, identity_id: Uuid) -> Result<Profile, AccessError> {
        match self.profiles.get_by_id(identity_id).await {
            Ok(profile) if profile.is_active => Ok(profile),
            Ok(_) => Err(denied(identity_id, "profile_inactive")),
            Err(FiligateError::NotFound { .. }) => Err(denied(identity_id, "profile_not_found")),
            Err(e) => Err(e.into()),
        }
    }

    /// Look up a profile whether or not it is active. Used for the
    /// subject of an administrative change, never for the actor.
    pub async fn find_profile(&self, identity_id: Uuid) -> Result<Option<Profile>, AccessError> {
        match self.profiles.get_by_id(identity_id).await {
            Ok(profile) => Ok(Some(profile)),
            Err(FiligateError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Syntax pre-check against `^[a-z0-9_]+$`. Only names that pass it can
/// be looked up, so malformed input never reaches the store.
pub fn parse_schema(raw_schema: &str) -> Option<SchemaName> {
    match SchemaName::parse(raw_schema) {
        Ok(schema) => Some(schema),
        Err(_) => {
            debug!(len = raw_schema.len(), "rejected malformed schema name");
            None
        }
    }
}

/// Maps schema names and tenant ids to [`Tenant`] records.
pub struct TenantDirectory<T: TenantRepository> {
    tenants: T,
}

impl<T: TenantRepository> TenantDirectory<T> {
    pub fn new(tenants: T) -> Self {
        Self { tenants }
    }

    /// Find the tenant owning `schema`. `Ok(None)` for an unknown schema.
    pub async fn find_tenant_by_schema(
        &self,
        schema: &SchemaName,
    ) -> Result<Option<Tenant>, AccessError> {
        match self.tenants.get_by_schema(schema).await {
            Ok(tenant) => Ok(Some(tenant)),
            Err(FiligateError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Find a tenant by id. `Ok(None)` when it does not exist.
    pub async fn find_tenant_by_id(&self, tenant_id: Uuid) -> Result<Option<Tenant>, AccessError> {
        match self.tenants.get_by_id(tenant_id).await {
            Ok(tenant) => Ok(Some(tenant)),
            Err(FiligateError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Every active tenant, ordered by name.
    pub async fn active_tenants(&self) -> Result<Vec<Tenant>, AccessError> {
        Ok(self.tenants.list_active().await?)
    }
}

#[cfg(test)]
mod tests {
    use filigate_core::models::tenant::MAX_SCHEMA_NAME_LEN;

    use super::*;

    #[test]
    fn schema_pre_check() {
        assert_eq!(
            parse_schema("acme_01").map(|s| s.as_str().to_owned()),
            Some("acme_01".to_owned())
        );
        for raw in ["", "Acme", "acme-1", "acme; DROP TABLE tenant", " acme"] {
            assert!(parse_schema(raw).is_none(), "{raw:?}");
        }
        assert!(parse_schema(&"a".repeat(MAX_SCHEMA_NAME_LEN + 1)).is_none());
    }
}
