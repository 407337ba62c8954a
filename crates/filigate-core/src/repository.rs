//! Repository trait definitions for data access abstraction.
//!
//! These are the stores the access engine reads from. All operations are
//! async; a missing row is reported as [`FiligateError::NotFound`], any
//! other failure as [`FiligateError::Database`].
//!
//! [`FiligateError::NotFound`]: crate::error::FiligateError::NotFound
//! [`FiligateError::Database`]: crate::error::FiligateError::Database

use uuid::Uuid;

use crate::error::FiligateResult;
use crate::models::{
    branch::{Branch, BranchCode, CreateBranch},
    grant::{BranchGrant, CreateBranchGrant, CreateTenantGrant, TenantGrant},
    profile::{CreateProfile, Profile, UpdateProfile},
    tenant::{CreateTenant, SchemaName, Tenant, UpdateTenant},
};

// ---------------------------------------------------------------------------
// Identities and tenants
// ---------------------------------------------------------------------------

pub trait ProfileRepository: Send + Sync {
    fn create(&self, input: CreateProfile) -> impl Future<Output = FiligateResult<Profile>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = FiligateResult<Profile>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateProfile,
    ) -> impl Future<Output = FiligateResult<Profile>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = FiligateResult<()>> + Send;
}

pub trait TenantRepository: Send + Sync {
    fn create(&self, input: CreateTenant) -> impl Future<Output = FiligateResult<Tenant>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = FiligateResult<Tenant>> + Send;
    /// Look up a tenant by its schema name, active or not.
    fn get_by_schema(
        &self,
        schema_name: &SchemaName,
    ) -> impl Future<Output = FiligateResult<Tenant>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateTenant,
    ) -> impl Future<Output = FiligateResult<Tenant>> + Send;
    /// All active tenants, ordered by name.
    fn list_active(&self) -> impl Future<Output = FiligateResult<Vec<Tenant>>> + Send;
}

// ---------------------------------------------------------------------------
// Grants
// ---------------------------------------------------------------------------

pub trait TenantGrantRepository: Send + Sync {
    /// Record a grant. Granting an existing pair returns the existing row.
    fn grant(
        &self,
        input: CreateTenantGrant,
    ) -> impl Future<Output = FiligateResult<TenantGrant>> + Send;
    fn revoke(
        &self,
        identity_id: Uuid,
        tenant_id: Uuid,
    ) -> impl Future<Output = FiligateResult<()>> + Send;
    fn exists(
        &self,
        identity_id: Uuid,
        tenant_id: Uuid,
    ) -> impl Future<Output = FiligateResult<bool>> + Send;
    /// Grants held by an identity, oldest first.
    fn list_for_user(
        &self,
        identity_id: Uuid,
    ) -> impl Future<Output = FiligateResult<Vec<TenantGrant>>> + Send;
}

pub trait BranchGrantRepository: Send + Sync {
    /// Record a restriction. Granting an existing pair is a no-op.
    fn grant(&self, input: CreateBranchGrant) -> impl Future<Output = FiligateResult<()>> + Send;
    fn revoke(
        &self,
        identity_id: Uuid,
        branch_id: Uuid,
    ) -> impl Future<Output = FiligateResult<()>> + Send;
    /// Every branch grant held by an identity across all tenants,
    /// including grants whose branch has since been deleted.
    fn list_for_user(
        &self,
        identity_id: Uuid,
    ) -> impl Future<Output = FiligateResult<Vec<BranchGrant>>> + Send;
}

// ---------------------------------------------------------------------------
// Branches (tenant scope)
// ---------------------------------------------------------------------------

pub trait BranchRepository: Send + Sync {
    fn create(&self, input: CreateBranch) -> impl Future<Output = FiligateResult<Branch>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = FiligateResult<Branch>> + Send;
    fn get_by_code(
        &self,
        tenant_id: Uuid,
        code: &BranchCode,
    ) -> impl Future<Output = FiligateResult<Branch>> + Send;
    /// Branches of a tenant, ordered by code.
    fn list_by_tenant(
        &self,
        tenant_id: Uuid,
    ) -> impl Future<Output = FiligateResult<Vec<Branch>>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = FiligateResult<()>> + Send;
}
