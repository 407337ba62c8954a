//! Explicit access grants.
//!
//! Tenant grants only ever add tenants beyond a profile's home tenant.
//! Branch grants are opt-in restrictions: a profile with none sees every
//! branch of the tenants it can access.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::branch::BranchCode;

/// Cross-tenant access granted to an identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TenantGrant {
    pub identity_id: Uuid,
    pub tenant_id: Uuid,
    /// Administrator who issued the grant, when known.
    pub granted_by: Option<Uuid>,
    pub granted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenantGrant {
    pub identity_id: Uuid,
    pub tenant_id: Uuid,
    pub granted_by: Option<Uuid>,
}

/// A branch restriction row, joined to the branch it points at.
///
/// `tenant_id` and `branch_code` are `None` when the branch no longer
/// exists; such a grant still counts as a restriction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BranchGrant {
    pub identity_id: Uuid,
    pub branch_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub branch_code: Option<BranchCode>,
    pub granted_at: DateTime<Utc>,
}

impl BranchGrant {
    /// The granted code, if the branch still exists and belongs to `tenant_id`.
    pub fn code_in(&self, tenant_id: Uuid) -> Option<&BranchCode> {
        match self.tenant_id {
            Some(owner) if owner == tenant_id => self.branch_code.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBranchGrant {
    pub identity_id: Uuid,
    pub branch_id: Uuid,
    pub granted_by: Option<Uuid>,
}
