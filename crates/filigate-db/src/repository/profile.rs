//! SurrealDB implementation of [`ProfileRepository`].
//!
//! Profile records are keyed by the identity-provider id, so the record
//! id is supplied by the caller rather than generated here.

use chrono::{DateTime, Utc};
use filigate_core::error::FiligateResult;
use filigate_core::models::profile::{
    CreateProfile, Profile, Role, UpdateProfile, check_home_tenant,
};
use filigate_core::repository::ProfileRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, parse_opt_uuid};

#[derive(Debug, SurrealValue)]
struct ProfileRow {
    role: String,
    tenant_id: Option<String>,
    can_switch_tenants: bool,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProfileRow {
    fn into_profile(self, id: Uuid) -> Result<Profile, DbError> {
        let role: Role = self
            .role
            .parse()
            .map_err(|e| DbError::Decode(format!("profile.role: {e}")))?;
        Ok(Profile {
            id,
            role,
            tenant_id: parse_opt_uuid("tenant", self.tenant_id.as_deref())?,
            can_switch_tenants: self.can_switch_tenants,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the identity resolver's store.
#[derive(Clone)]
pub struct SurrealProfileRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealProfileRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ProfileRepository for SurrealProfileRepository<C> {
    async fn create(&self, input: CreateProfile) -> FiligateResult<Profile> {
        input.validate()?;

        let id_str = input.id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('profile', $id) SET \
                 role = $role, tenant_id = $tenant_id, \
                 can_switch_tenants = $can_switch_tenants, \
                 is_active = true",
            )
            .bind(("id", id_str.clone()))
            .bind(("role", input.role.as_str()))
            .bind(("tenant_id", input.tenant_id.map(|t| t.to_string())))
            .bind(("can_switch_tenants", input.can_switch_tenants))
            .await
            .map_err(DbError::from)?;

        // CREATE on an existing record id fails at statement level.
        let mut result = result.check().map_err(|_| DbError::AlreadyExists {
            entity: format!("profile {id_str}"),
        })?;

        let rows: Vec<ProfileRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "profile".into(),
            id: id_str,
        })?;

        Ok(row.into_profile(input.id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> FiligateResult<Profile> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('profile', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProfileRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "profile".into(),
            id: id_str,
        })?;

        Ok(row.into_profile(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateProfile) -> FiligateResult<Profile> {
        // Role and home tenant are validated as a pair, so resolve the
        // resulting combination against the current row first.
        if input.role.is_some() || input.tenant_id.is_some() {
            let current = self.get_by_id(id).await?;
            let role = input.role.unwrap_or(current.role);
            let tenant_id = input.tenant_id.unwrap_or(current.tenant_id);
            check_home_tenant(role, tenant_id)?;
        }

        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.role.is_some() {
            sets.push("role = $role");
        }
        if input.tenant_id.is_some() {
            sets.push("tenant_id = $tenant_id");
        }
        if input.can_switch_tenants.is_some() {
            sets.push("can_switch_tenants = $can_switch_tenants");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('profile', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));
        if let Some(role) = input.role {
            builder = builder.bind(("role", role.as_str()));
        }
        if let Some(tenant_id) = input.tenant_id {
            builder = builder.bind(("tenant_id", tenant_id.map(|t| t.to_string())));
        }
        if let Some(can_switch) = input.can_switch_tenants {
            builder = builder.bind(("can_switch_tenants", can_switch));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<ProfileRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "profile".into(),
            id: id_str,
        })?;

        Ok(row.into_profile(id)?)
    }

    async fn delete(&self, id: Uuid) -> FiligateResult<()> {
        let id_str = id.to_string();

        // Grants belong to the identity; drop them with the profile.
        self.db
            .query(
                "DELETE branch_grant WHERE identity_id = $id; \
                 DELETE has_tenant_access WHERE in = type::record('profile', $id); \
                 DELETE type::record('profile', $id);",
            )
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }
}
