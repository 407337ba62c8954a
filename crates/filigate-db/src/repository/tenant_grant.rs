//! SurrealDB implementation of [`TenantGrantRepository`].
//!
//! Grants are `has_tenant_access` edges from a profile to a tenant.

use chrono::{DateTime, Utc};
use filigate_core::error::FiligateResult;
use filigate_core::models::grant::{CreateTenantGrant, TenantGrant};
use filigate_core::repository::TenantGrantRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, parse_opt_uuid, parse_uuid};

const SELECT_GRANT: &str = "\
SELECT meta::id(in) AS identity_id, meta::id(out) AS tenant_id, \
    granted_by, granted_at \
FROM has_tenant_access";

#[derive(Debug, SurrealValue)]
struct TenantGrantRow {
    identity_id: String,
    tenant_id: String,
    granted_by: Option<String>,
    granted_at: DateTime<Utc>,
}

impl TenantGrantRow {
    fn try_into_grant(self) -> Result<TenantGrant, DbError> {
        Ok(TenantGrant {
            identity_id: parse_uuid("identity", &self.identity_id)?,
            tenant_id: parse_uuid("tenant", &self.tenant_id)?,
            granted_by: parse_opt_uuid("granted_by", self.granted_by.as_deref())?,
            granted_at: self.granted_at,
        })
    }
}

#[derive(Clone)]
pub struct SurrealTenantGrantRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTenantGrantRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn find(&self, identity_id: Uuid, tenant_id: Uuid) -> Result<Option<TenantGrant>, DbError> {
        let query = format!(
            "{SELECT_GRANT} WHERE in = type::record('profile', $identity_id) \
             AND out = type::record('tenant', $tenant_id)"
        );
        let mut result = self
            .db
            .query(query)
            .bind(("identity_id", identity_id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await?;

        let rows: Vec<TenantGrantRow> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(TenantGrantRow::try_into_grant)
            .transpose()
    }
}

impl<C: Connection> TenantGrantRepository for SurrealTenantGrantRepository<C> {
    async fn grant(&self, input: CreateTenantGrant) -> FiligateResult<TenantGrant> {
        if let Some(existing) = self.find(input.identity_id, input.tenant_id).await? {
            return Ok(existing);
        }

        // RELATE requires literal record-id syntax; UUIDs are safe to embed.
        let identity_str = input.identity_id.to_string();
        let tenant_str = input.tenant_id.to_string();
        let query = format!(
            "RELATE profile:`{identity_str}` -> has_tenant_access -> tenant:`{tenant_str}` \
             SET granted_by = $granted_by;"
        );

        self.db
            .query(query)
            .bind(("granted_by", input.granted_by.map(|g| g.to_string())))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        let grant = self
            .find(input.identity_id, input.tenant_id)
            .await?
            .ok_or_else(|| DbError::NotFound {
                entity: "tenant_grant".into(),
                id: format!("identity={identity_str},tenant={tenant_str}"),
            })?;

        Ok(grant)
    }

    async fn revoke(&self, identity_id: Uuid, tenant_id: Uuid) -> FiligateResult<()> {
        self.db
            .query(
                "DELETE has_tenant_access WHERE \
                 in = type::record('profile', $identity_id) AND \
                 out = type::record('tenant', $tenant_id)",
            )
            .bind(("identity_id", identity_id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn exists(&self, identity_id: Uuid, tenant_id: Uuid) -> FiligateResult<bool> {
        Ok(self.find(identity_id, tenant_id).await?.is_some())
    }

    async fn list_for_user(&self, identity_id: Uuid) -> FiligateResult<Vec<TenantGrant>> {
        let query = format!(
            "{SELECT_GRANT} WHERE in = type::record('profile', $identity_id) \
             ORDER BY granted_at ASC"
        );
        let mut result = self
            .db
            .query(query)
            .bind(("identity_id", identity_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantGrantRow> = result.take(0).map_err(DbError::from)?;
        let grants = rows
            .into_iter()
            .map(TenantGrantRow::try_into_grant)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(grants)
    }
}
