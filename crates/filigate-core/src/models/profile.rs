//! Profile domain model.
//!
//! A profile is the access-relevant view of an identity issued by the
//! external identity provider: its role, its home tenant and whether it
//! may switch between tenants in the dashboard.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FiligateError, FiligateResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Platform operator. Has no home tenant and is never narrowed by grants.
    Superadmin,
    /// Tenant administrator. May manage grants within tenants it can access.
    Admin,
    User,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Superadmin => "superadmin",
            Role::Admin => "admin",
            Role::User => "user",
            Role::Viewer => "viewer",
        }
    }

    /// Whether this role may administer grants and branches.
    pub fn is_administrative(&self) -> bool {
        matches!(self, Role::Superadmin | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = FiligateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "superadmin" => Ok(Role::Superadmin),
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            "viewer" => Ok(Role::Viewer),
            other => Err(FiligateError::validation(format!("unknown role: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Identity id issued by the identity provider.
    pub id: Uuid,
    pub role: Role,
    /// Home tenant. `None` only for superadmins.
    pub tenant_id: Option<Uuid>,
    /// Whether the dashboard offers the tenant switcher to this identity.
    pub can_switch_tenants: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn is_superadmin(&self) -> bool {
        self.role == Role::Superadmin
    }
}

/// Fields required to provision a profile for an existing identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProfile {
    pub id: Uuid,
    pub role: Role,
    pub tenant_id: Option<Uuid>,
    pub can_switch_tenants: bool,
}

impl CreateProfile {
    /// Superadmins have no home tenant; every other role has exactly one.
    pub fn validate(&self) -> FiligateResult<()> {
        check_home_tenant(self.role, self.tenant_id)
    }
}

/// Fields that can be updated on an existing profile.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateProfile {
    pub role: Option<Role>,
    /// `Some(Some(id))` = set, `Some(None)` = clear, `None` = no change.
    pub tenant_id: Option<Option<Uuid>>,
    pub can_switch_tenants: Option<bool>,
    pub is_active: Option<bool>,
}

/// Checks the role/home-tenant pairing shared by create and update.
pub fn check_home_tenant(role: Role, tenant_id: Option<Uuid>) -> FiligateResult<()> {
    match (role, tenant_id) {
        (Role::Superadmin, None) => Ok(()),
        (Role::Superadmin, Some(_)) => Err(FiligateError::validation(
            "superadmin profiles have no home tenant",
        )),
        (_, Some(_)) => Ok(()),
        (role, None) => Err(FiligateError::validation(format!(
            "{role} profiles require a home tenant"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::Superadmin, Role::Admin, Role::User, Role::Viewer] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("root".parse::<Role>().is_err());
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn home_tenant_pairing() {
        let tenant = Some(Uuid::new_v4());
        assert!(check_home_tenant(Role::Superadmin, None).is_ok());
        assert!(check_home_tenant(Role::Superadmin, tenant).is_err());
        assert!(check_home_tenant(Role::Admin, tenant).is_ok());
        assert!(check_home_tenant(Role::Viewer, None).is_err());
    }

    #[test]
    fn only_superadmin_and_admin_are_administrative() {
        assert!(Role::Superadmin.is_administrative());
        assert!(Role::Admin.is_administrative());
        assert!(!Role::User.is_administrative());
        assert!(!Role::Viewer.is_administrative());
    }
}
