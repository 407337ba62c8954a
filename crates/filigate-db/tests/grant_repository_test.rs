//! Integration tests for tenant and branch grant repositories using
//! in-memory SurrealDB.

use filigate_core::models::branch::{BranchCode, CreateBranch};
use filigate_core::models::grant::{CreateBranchGrant, CreateTenantGrant};
use filigate_core::models::profile::{CreateProfile, Role};
use filigate_core::models::tenant::{CreateTenant, SchemaName};
use filigate_core::repository::{
    BranchGrantRepository, BranchRepository, ProfileRepository, TenantGrantRepository,
    TenantRepository,
};
use filigate_db::repository::Stores;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

/// Helper: in-memory DB with two tenants and one user homed in the first.
async fn setup() -> (Stores<Db>, Uuid, Uuid, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    filigate_db::run_migrations(&db).await.unwrap();
    let stores = Stores::new(db);

    let home = stores
        .tenants
        .create(CreateTenant {
            name: "Home".into(),
            schema_name: SchemaName::parse("home").unwrap(),
        })
        .await
        .unwrap();
    let other = stores
        .tenants
        .create(CreateTenant {
            name: "Other".into(),
            schema_name: SchemaName::parse("other").unwrap(),
        })
        .await
        .unwrap();

    let user = stores
        .profiles
        .create(CreateProfile {
            id: Uuid::new_v4(),
            role: Role::User,
            tenant_id: Some(home.id),
            can_switch_tenants: false,
        })
        .await
        .unwrap();

    (stores, home.id, other.id, user.id)
}

async fn branch(stores: &Stores<Db>, tenant_id: Uuid, raw: &str) -> Uuid {
    stores
        .branches
        .create(CreateBranch {
            tenant_id,
            branch_code: BranchCode::parse(raw).unwrap(),
            store_code: None,
            description: None,
        })
        .await
        .unwrap()
        .id
}

// -----------------------------------------------------------------------
// Tenant grants
// -----------------------------------------------------------------------

#[tokio::test]
async fn tenant_grant_exists_after_grant_and_not_after_revoke() {
    let (stores, _home, other, user) = setup().await;
    let admin = Uuid::new_v4();

    assert!(!stores.tenant_grants.exists(user, other).await.unwrap());

    let grant = stores
        .tenant_grants
        .grant(CreateTenantGrant {
            identity_id: user,
            tenant_id: other,
            granted_by: Some(admin),
        })
        .await
        .unwrap();
    assert_eq!(grant.identity_id, user);
    assert_eq!(grant.tenant_id, other);
    assert_eq!(grant.granted_by, Some(admin));

    assert!(stores.tenant_grants.exists(user, other).await.unwrap());

    stores.tenant_grants.revoke(user, other).await.unwrap();
    assert!(!stores.tenant_grants.exists(user, other).await.unwrap());
}

#[tokio::test]
async fn tenant_grant_is_idempotent() {
    let (stores, _home, other, user) = setup().await;
    let input = CreateTenantGrant {
        identity_id: user,
        tenant_id: other,
        granted_by: None,
    };

    let first = stores.tenant_grants.grant(input.clone()).await.unwrap();
    let second = stores.tenant_grants.grant(input).await.unwrap();
    assert_eq!(first, second);

    let grants = stores.tenant_grants.list_for_user(user).await.unwrap();
    assert_eq!(grants.len(), 1);
}

#[tokio::test]
async fn tenant_grants_are_per_identity() {
    let (stores, home, other, user) = setup().await;
    let someone_else = Uuid::new_v4();

    stores
        .tenant_grants
        .grant(CreateTenantGrant {
            identity_id: user,
            tenant_id: other,
            granted_by: None,
        })
        .await
        .unwrap();

    assert!(!stores.tenant_grants.exists(someone_else, other).await.unwrap());
    // The home tenant is never stored as a grant.
    assert!(!stores.tenant_grants.exists(user, home).await.unwrap());
    assert!(
        stores
            .tenant_grants
            .list_for_user(someone_else)
            .await
            .unwrap()
            .is_empty()
    );
}

// -----------------------------------------------------------------------
// Branch grants
// -----------------------------------------------------------------------

#[tokio::test]
async fn no_branch_grants_lists_nothing() {
    let (stores, _home, _other, user) = setup().await;
    assert!(stores.branch_grants.list_for_user(user).await.unwrap().is_empty());
}

#[tokio::test]
async fn branch_grants_resolve_tenant_and_code() {
    let (stores, home, other, user) = setup().await;
    let home_1 = branch(&stores, home, "1").await;
    let other_1 = branch(&stores, other, "1").await;

    for branch_id in [home_1, other_1] {
        stores
            .branch_grants
            .grant(CreateBranchGrant {
                identity_id: user,
                branch_id,
                granted_by: None,
            })
            .await
            .unwrap();
    }

    let grants = stores.branch_grants.list_for_user(user).await.unwrap();
    assert_eq!(grants.len(), 2);

    let home_grant = grants.iter().find(|g| g.branch_id == home_1).unwrap();
    assert_eq!(home_grant.tenant_id, Some(home));
    assert_eq!(home_grant.code_in(home).map(|c| c.as_str()), Some("1"));
    assert_eq!(home_grant.code_in(other), None);

    let other_grant = grants.iter().find(|g| g.branch_id == other_1).unwrap();
    assert_eq!(other_grant.tenant_id, Some(other));
}

#[tokio::test]
async fn branch_grant_survives_branch_deletion() {
    let (stores, home, _other, user) = setup().await;
    let doomed = branch(&stores, home, "3").await;

    stores
        .branch_grants
        .grant(CreateBranchGrant {
            identity_id: user,
            branch_id: doomed,
            granted_by: None,
        })
        .await
        .unwrap();
    stores.branches.delete(doomed).await.unwrap();

    let grants = stores.branch_grants.list_for_user(user).await.unwrap();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].branch_id, doomed);
    assert_eq!(grants[0].tenant_id, None);
    assert_eq!(grants[0].branch_code, None);
}

#[tokio::test]
async fn branch_grant_is_idempotent_and_revocable() {
    let (stores, home, _other, user) = setup().await;
    let b = branch(&stores, home, "5").await;
    let input = CreateBranchGrant {
        identity_id: user,
        branch_id: b,
        granted_by: None,
    };

    stores.branch_grants.grant(input.clone()).await.unwrap();
    stores.branch_grants.grant(input).await.unwrap();
    assert_eq!(stores.branch_grants.list_for_user(user).await.unwrap().len(), 1);

    stores.branch_grants.revoke(user, b).await.unwrap();
    assert!(stores.branch_grants.list_for_user(user).await.unwrap().is_empty());
}

#[tokio::test]
async fn deleting_profile_drops_its_grants() {
    let (stores, home, other, user) = setup().await;
    let b = branch(&stores, home, "8").await;
    stores
        .branch_grants
        .grant(CreateBranchGrant {
            identity_id: user,
            branch_id: b,
            granted_by: None,
        })
        .await
        .unwrap();
    stores
        .tenant_grants
        .grant(CreateTenantGrant {
            identity_id: user,
            tenant_id: other,
            granted_by: None,
        })
        .await
        .unwrap();

    stores.profiles.delete(user).await.unwrap();

    assert!(stores.branch_grants.list_for_user(user).await.unwrap().is_empty());
    assert!(!stores.tenant_grants.exists(user, other).await.unwrap());
}
