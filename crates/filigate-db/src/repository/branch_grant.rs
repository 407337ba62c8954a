//! SurrealDB implementation of [`BranchGrantRepository`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use filigate_core::error::FiligateResult;
use filigate_core::models::grant::{BranchGrant, CreateBranchGrant};
use filigate_core::repository::BranchGrantRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid};
use crate::repository::branch::decode_code;

#[derive(Debug, SurrealValue)]
struct GrantRow {
    branch_id: String,
    granted_at: DateTime<Utc>,
}

/// The owning tenant and code of a granted branch that still exists.
#[derive(Debug, SurrealValue)]
struct GrantedBranchRow {
    record_id: String,
    tenant_id: String,
    branch_code: String,
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

#[derive(Clone)]
pub struct SurrealBranchGrantRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealBranchGrantRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> BranchGrantRepository for SurrealBranchGrantRepository<C> {
    async fn grant(&self, input: CreateBranchGrant) -> FiligateResult<()> {
        let identity_str = input.identity_id.to_string();
        let branch_str = input.branch_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM branch_grant \
                 WHERE identity_id = $identity_id AND branch_id = $branch_id \
                 GROUP ALL",
            )
            .bind(("identity_id", identity_str.clone()))
            .bind(("branch_id", branch_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        if count_rows.first().map(|r| r.total).unwrap_or(0) > 0 {
            return Ok(());
        }

        self.db
            .query(
                "CREATE branch_grant SET \
                 identity_id = $identity_id, branch_id = $branch_id, \
                 granted_by = $granted_by",
            )
            .bind(("identity_id", identity_str))
            .bind(("branch_id", branch_str))
            .bind(("granted_by", input.granted_by.map(|g| g.to_string())))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn revoke(&self, identity_id: Uuid, branch_id: Uuid) -> FiligateResult<()> {
        self.db
            .query(
                "DELETE branch_grant WHERE \
                 identity_id = $identity_id AND branch_id = $branch_id",
            )
            .bind(("identity_id", identity_id.to_string()))
            .bind(("branch_id", branch_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list_for_user(&self, identity_id: Uuid) -> FiligateResult<Vec<BranchGrant>> {
        // Statement 0 is the grant rows, statement 1 the branches they
        // still resolve to.
        let mut result = self
            .db
            .query(
                "SELECT branch_id, granted_at FROM branch_grant \
                 WHERE identity_id = $identity_id \
                 ORDER BY granted_at ASC; \
                 SELECT meta::id(id) AS record_id, tenant_id, branch_code \
                 FROM branch \
                 WHERE meta::id(id) IN (\
                     SELECT VALUE branch_id FROM branch_grant \
                     WHERE identity_id = $identity_id\
                 );",
            )
            .bind(("identity_id", identity_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let grants: Vec<GrantRow> = result.take(0).map_err(DbError::from)?;
        let branches: Vec<GrantedBranchRow> = result.take(1).map_err(DbError::from)?;

        let mut resolved = HashMap::with_capacity(branches.len());
        for row in branches {
            let tenant_id = parse_uuid("tenant", &row.tenant_id)?;
            let code = decode_code(&row.branch_code)?;
            resolved.insert(row.record_id, (tenant_id, code));
        }

        let grants = grants
            .into_iter()
            .map(|row| {
                let branch_id = parse_uuid("branch", &row.branch_id)?;
                let (tenant_id, branch_code) = match resolved.get(&row.branch_id) {
                    Some((tenant_id, code)) => (Some(*tenant_id), Some(code.clone())),
                    None => (None, None),
                };
                Ok(BranchGrant {
                    identity_id,
                    branch_id,
                    tenant_id,
                    branch_code,
                    granted_at: row.granted_at,
                })
            })
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(grants)
    }
}
