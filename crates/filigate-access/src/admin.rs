//! Grant administration checks.
//!
//! Who may hand out or take back tenant and branch grants. Superadmins
//! may change anything. Admins may only hand out tenants they can reach
//! themselves, and only touch branches inside those tenants. Everyone
//! else may at most read their own tenant grants.

use filigate_core::error::FiligateError;
use filigate_core::models::branch::Branch;
use filigate_core::models::grant::{CreateBranchGrant, CreateTenantGrant, TenantGrant};
use filigate_core::models::profile::{Profile, Role};
use filigate_core::repository::{
    BranchGrantRepository, BranchRepository, ProfileRepository, TenantGrantRepository,
    TenantRepository,
};
use tracing::info;
use uuid::Uuid;

use crate::error::{AccessError, denied};
use crate::service::AccessService;

/// Administrative view over an [`AccessService`]'s stores.
pub struct GrantAdmin<'a, P, T, G, B, BG>
where
    P: ProfileRepository,
    T: TenantRepository,
    G: TenantGrantRepository,
    B: BranchRepository,
    BG: BranchGrantRepository,
{
    service: &'a AccessService<P, T, G, B, BG>,
}

impl<P, T, G, B, BG> AccessService<P, T, G, B, BG>
where
    P: ProfileRepository,
    T: TenantRepository,
    G: TenantGrantRepository,
    B: BranchRepository,
    BG: BranchGrantRepository,
{
    pub fn admin(&self) -> GrantAdmin<'_, P, T, G, B, BG> {
        GrantAdmin { service: self }
    }
}

impl<P, T, G, B, BG> GrantAdmin<'_, P, T, G, B, BG>
where
    P: ProfileRepository,
    T: TenantRepository,
    G: TenantGrantRepository,
    B: BranchRepository,
    BG: BranchGrantRepository,
{
    /// Tenant grants held by `target`. Readable by the target and by
    /// administrators.
    pub async fn list_tenant_grants(
        &self,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> Result<Vec<TenantGrant>, AccessError> {
        let actor = self.actor(actor_id).await?;
        if actor.id != target_id && !actor.role.is_administrative() {
            return Err(denied(actor_id, "not_administrator"));
        }
        Ok(self
            .service
            .gate()
            .evaluator()
            .grants()
            .list_for_user(target_id)
            .await?)
    }

    /// Grant `target` access to every tenant in `tenant_ids`.
    ///
    /// All tenants are checked before anything is written, so a refusal
    /// leaves the store untouched. The target's home tenant is skipped.
    pub async fn grant_tenant_access(
        &self,
        actor_id: Uuid,
        target_id: Uuid,
        tenant_ids: &[Uuid],
    ) -> Result<Vec<TenantGrant>, AccessError> {
        let actor = self.administrator(actor_id).await?;
        let target = self.target(actor_id, target_id).await?;

        for &tenant_id in tenant_ids {
            if self
                .service
                .gate()
                .directory()
                .find_tenant_by_id(tenant_id)
                .await?
                .is_none()
            {
                return Err(denied(actor_id, "tenant_unknown"));
            }
            self.require_tenant(&actor, tenant_id).await?;
        }

        let store = self.service.gate().evaluator().grants();
        let mut granted = Vec::with_capacity(tenant_ids.len());
        for &tenant_id in tenant_ids {
            if target.tenant_id == Some(tenant_id) {
                continue;
            }
            let grant = store
                .grant(CreateTenantGrant {
                    identity_id: target.id,
                    tenant_id,
                    granted_by: Some(actor.id),
                })
                .await?;
            granted.push(grant);
        }

        info!(
            actor_id = %actor.id,
            target_id = %target.id,
            tenants = granted.len(),
            "tenant access granted"
        );
        Ok(granted)
    }

    pub async fn revoke_tenant_access(
        &self,
        actor_id: Uuid,
        target_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<(), AccessError> {
        let actor = self.administrator(actor_id).await?;
        let target = self.target(actor_id, target_id).await?;
        self.require_tenant(&actor, tenant_id).await?;

        self.service
            .gate()
            .evaluator()
            .grants()
            .revoke(target.id, tenant_id)
            .await?;

        info!(
            actor_id = %actor.id,
            target_id = %target.id,
            %tenant_id,
            "tenant access revoked"
        );
        Ok(())
    }

    /// Restrict `target` to `branch_id` (in addition to any branches it
    /// is already restricted to). Superadmins cannot be restricted.
    pub async fn grant_branch_access(
        &self,
        actor_id: Uuid,
        target_id: Uuid,
        branch_id: Uuid,
    ) -> Result<(), AccessError> {
        let actor = self.administrator(actor_id).await?;
        let target = self.target(actor_id, target_id).await?;
        match target.role {
            Role::Superadmin => return Err(denied(actor_id, "target_superadmin")),
            Role::Admin | Role::User | Role::Viewer => {}
        }
        let branch = match self.branch(branch_id).await? {
            Some(branch) => branch,
            None => return Err(denied(actor_id, "branch_unknown")),
        };
        self.require_tenant(&actor, branch.tenant_id).await?;

        self.service
            .branch_grants()
            .grant(CreateBranchGrant {
                identity_id: target.id,
                branch_id,
                granted_by: Some(actor.id),
            })
            .await?;

        info!(
            actor_id = %actor.id,
            target_id = %target.id,
            %branch_id,
            branch_code = %branch.branch_code,
            "branch access granted"
        );
        Ok(())
    }

    /// Remove a branch grant. A grant whose branch was deleted is checked
    /// against the target's home tenant instead.
    pub async fn revoke_branch_access(
        &self,
        actor_id: Uuid,
        target_id: Uuid,
        branch_id: Uuid,
    ) -> Result<(), AccessError> {
        let actor = self.administrator(actor_id).await?;
        let target = self.target(actor_id, target_id).await?;

        match (self.branch(branch_id).await?, target.tenant_id) {
            (Some(branch), _) => self.require_tenant(&actor, branch.tenant_id).await?,
            (None, _) if actor.is_superadmin() => {}
            (None, Some(home)) => self.require_tenant(&actor, home).await?,
            (None, None) => return Err(denied(actor_id, "branch_unknown")),
        }

        self.service
            .branch_grants()
            .revoke(target.id, branch_id)
            .await?;

        info!(
            actor_id = %actor.id,
            target_id = %target.id,
            %branch_id,
            "branch access revoked"
        );
        Ok(())
    }

    /// Whether `actor_id` may create, edit or delete branches of
    /// `tenant_id`. Store failures are returned, not folded into `false`.
    pub async fn can_manage_branches(
        &self,
        actor_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<bool, AccessError> {
        let result = async {
            let actor = self.administrator(actor_id).await?;
            self.require_tenant(&actor, tenant_id).await
        }
        .await;
        match result {
            Ok(()) => Ok(true),
            Err(AccessError::Denied) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn actor(&self, actor_id: Uuid) -> Result<Profile, AccessError> {
        self.service
            .gate()
            .identities()
            .resolve_profile(actor_id)
            .await
    }

    async fn administrator(&self, actor_id: Uuid) -> Result<Profile, AccessError> {
        let actor = self.actor(actor_id).await?;
        match actor.role {
            Role::Superadmin | Role::Admin => Ok(actor),
            Role::User | Role::Viewer => Err(denied(actor_id, "not_administrator")),
        }
    }

    async fn target(&self, actor_id: Uuid, target_id: Uuid) -> Result<Profile, AccessError> {
        self.service
            .gate()
            .identities()
            .find_profile(target_id)
            .await?
            .ok_or_else(|| denied(actor_id, "target_not_found"))
    }

    async fn branch(&self, branch_id: Uuid) -> Result<Option<Branch>, AccessError> {
        match self.service.branches().get_by_id(branch_id).await {
            Ok(branch) => Ok(Some(branch)),
            Err(FiligateError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// An administrator may only act on tenants it can access itself.
    async fn require_tenant(&self, actor: &Profile, tenant_id: Uuid) -> Result<(), AccessError> {
        let reachable = self
            .service
            .gate()
            .evaluator()
            .can_access_tenant(actor, tenant_id)
            .await?;
        if reachable {
            Ok(())
        } else {
            Err(denied(actor.id, "tenant_not_accessible"))
        }
    }
}
