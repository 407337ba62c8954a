//! Tenant access evaluation.
//!
//! Decision table, first match wins:
//!
//! | # | condition                               | result |
//! |---|-----------------------------------------|--------|
//! | 1 | role is superadmin                      | allow  |
//! | 2 | home tenant equals the requested tenant | allow  |
//! | 3 | a tenant grant exists for the pair      | allow  |
//! | 4 | otherwise                               | deny   |
//!
//! The caller supplies the profile; nothing here re-reads it.

use filigate_core::models::profile::{Profile, Role};
use filigate_core::repository::TenantGrantRepository;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AccessError;

/// Which row of the decision table admitted the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessBasis {
    Superadmin,
    HomeTenant,
    TenantGrant,
}

/// Rows 1 and 2 of the decision table, which need no store lookup.
pub fn direct_basis(profile: &Profile, tenant_id: Uuid) -> Option<AccessBasis> {
    match (profile.role, profile.tenant_id) {
        (Role::Superadmin, _) => Some(AccessBasis::Superadmin),
        (Role::Admin | Role::User | Role::Viewer, Some(home)) if home == tenant_id => {
            Some(AccessBasis::HomeTenant)
        }
        (Role::Admin | Role::User | Role::Viewer, _) => None,
    }
}

pub struct TenantAccessEvaluator<G: TenantGrantRepository> {
    grants: G,
}

impl<G: TenantGrantRepository> TenantAccessEvaluator<G> {
    pub fn new(grants: G) -> Self {
        Self { grants }
    }

    /// The grant store backing row 3.
    pub fn grants(&self) -> &G {
        &self.grants
    }

    /// Evaluate the decision table, returning the basis on success and
    /// `None` on deny.
    pub async fn evaluate(
        &self,
        profile: &Profile,
        tenant_id: Uuid,
    ) -> Result<Option<AccessBasis>, AccessError> {
        if let Some(basis) = direct_basis(profile, tenant_id) {
            return Ok(Some(basis));
        }
        let granted = self.grants.exists(profile.id, tenant_id).await?;
        Ok(granted.then_some(AccessBasis::TenantGrant))
    }

    pub async fn can_access_tenant(
        &self,
        profile: &Profile,
        tenant_id: Uuid,
    ) -> Result<bool, AccessError> {
        Ok(self.evaluate(profile, tenant_id).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn profile(role: Role, tenant_id: Option<Uuid>) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            role,
            tenant_id,
            can_switch_tenants: false,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn superadmin_matches_first_row_for_any_tenant() {
        let p = profile(Role::Superadmin, None);
        assert_eq!(
            direct_basis(&p, Uuid::new_v4()),
            Some(AccessBasis::Superadmin)
        );
    }

    #[test]
    fn home_tenant_matches_second_row() {
        let home = Uuid::new_v4();
        for role in [Role::Admin, Role::User, Role::Viewer] {
            let p = profile(role, Some(home));
            assert_eq!(direct_basis(&p, home), Some(AccessBasis::HomeTenant));
            assert_eq!(direct_basis(&p, Uuid::new_v4()), None);
        }
    }

    #[test]
    fn homeless_non_superadmin_has_no_direct_basis() {
        let p = profile(Role::Viewer, None);
        assert_eq!(direct_basis(&p, Uuid::new_v4()), None);
    }
}
