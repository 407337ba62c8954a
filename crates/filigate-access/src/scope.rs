//! Branch scope resolution.
//!
//! Branch grants are restrictions, not permissions, and never apply to
//! superadmins. An identity with no grants at all sees every branch of
//! the tenants it can access; an identity with any grant sees only the
//! granted branches, tenant by tenant.

use std::collections::BTreeSet;

use filigate_core::models::branch::BranchCode;
use filigate_core::models::grant::BranchGrant;
use filigate_core::models::profile::{Profile, Role};
use filigate_core::repository::BranchGrantRepository;
use serde::Serialize;
use tracing::trace;
use uuid::Uuid;

use crate::error::AccessError;

/// Branches an identity may see within one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "codes", rename_all = "snake_case")]
pub enum AllowedBranches {
    Unrestricted,
    /// May be empty: dangling or foreign-tenant grants still restrict.
    Restricted(BTreeSet<BranchCode>),
}

impl AllowedBranches {
    /// Build the allowed set for `tenant_id` from every grant the identity
    /// holds, across all tenants.
    pub fn from_grants(grants: &[BranchGrant], tenant_id: Uuid) -> Self {
        if grants.is_empty() {
            return AllowedBranches::Unrestricted;
        }
        let codes = grants
            .iter()
            .filter_map(|g| g.code_in(tenant_id))
            .cloned()
            .collect();
        AllowedBranches::Restricted(codes)
    }

    pub fn is_unrestricted(&self) -> bool {
        matches!(self, AllowedBranches::Unrestricted)
    }

    pub fn permits(&self, code: &BranchCode) -> bool {
        match self {
            AllowedBranches::Unrestricted => true,
            AllowedBranches::Restricted(codes) => codes.contains(code),
        }
    }
}

pub struct BranchScopeResolver<BG: BranchGrantRepository> {
    grants: BG,
}

impl<BG: BranchGrantRepository> BranchScopeResolver<BG> {
    pub fn new(grants: BG) -> Self {
        Self { grants }
    }

    pub fn grants(&self) -> &BG {
        &self.grants
    }

    /// Resolve the branches `profile` may see in `tenant_id`.
    ///
    /// Superadmins are never narrowed, whatever grants they hold. Does
    /// not check tenant access; callers pass a profile and tenant that
    /// already went through the gate.
    pub async fn resolve_allowed_branches(
        &self,
        profile: &Profile,
        tenant_id: Uuid,
    ) -> Result<AllowedBranches, AccessError> {
        match profile.role {
            Role::Superadmin => return Ok(AllowedBranches::Unrestricted),
            Role::Admin | Role::User | Role::Viewer => {}
        }

        let grants = self.grants.list_for_user(profile.id).await?;
        let allowed = AllowedBranches::from_grants(&grants, tenant_id);
        trace!(
            identity_id = %profile.id,
            %tenant_id,
            grants = grants.len(),
            unrestricted = allowed.is_unrestricted(),
            "resolved branch scope"
        );
        Ok(allowed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn code(raw: &str) -> BranchCode {
        BranchCode::parse(raw).unwrap()
    }

    fn grant(tenant_id: Option<Uuid>, raw: Option<&str>) -> BranchGrant {
        BranchGrant {
            identity_id: Uuid::nil(),
            branch_id: Uuid::new_v4(),
            tenant_id,
            branch_code: raw.map(code),
            granted_at: Utc::now(),
        }
    }

    #[test]
    fn no_grants_is_unrestricted() {
        let allowed = AllowedBranches::from_grants(&[], Uuid::new_v4());
        assert_eq!(allowed, AllowedBranches::Unrestricted);
        assert!(allowed.permits(&code("99")));
    }

    #[test]
    fn grants_in_tenant_become_codes() {
        let tenant = Uuid::new_v4();
        let grants = [grant(Some(tenant), Some("1")), grant(Some(tenant), Some("4"))];
        let allowed = AllowedBranches::from_grants(&grants, tenant);
        assert_eq!(
            allowed,
            AllowedBranches::Restricted([code("1"), code("4")].into())
        );
        assert!(allowed.permits(&code("4")));
        assert!(!allowed.permits(&code("7")));
    }

    #[test]
    fn dangling_grants_restrict_to_nothing() {
        let grants = [grant(None, None)];
        let allowed = AllowedBranches::from_grants(&grants, Uuid::new_v4());
        assert_eq!(allowed, AllowedBranches::Restricted(BTreeSet::new()));
    }

    #[test]
    fn colliding_codes_in_other_tenant_are_ignored() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let grants = [grant(Some(a), Some("1"))];
        assert_eq!(
            AllowedBranches::from_grants(&grants, b),
            AllowedBranches::Restricted(BTreeSet::new())
        );
    }

    #[test]
    fn serializes_with_kind_tag() {
        let json = serde_json::to_value(AllowedBranches::Restricted([code("2")].into())).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "restricted", "codes": ["2"]}));
        let json = serde_json::to_value(AllowedBranches::Unrestricted).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "unrestricted"}));
    }
}
