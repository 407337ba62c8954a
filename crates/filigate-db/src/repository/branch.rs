//! SurrealDB implementation of [`BranchRepository`].

use chrono::{DateTime, Utc};
use filigate_core::error::FiligateResult;
use filigate_core::models::branch::{Branch, BranchCode, CreateBranch};
use filigate_core::repository::BranchRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid};

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct BranchRow {
    tenant_id: String,
    branch_code: String,
    store_code: Option<String>,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BranchRow {
    fn into_branch(self, id: Uuid) -> Result<Branch, DbError> {
        Ok(Branch {
            id,
            tenant_id: parse_uuid("tenant", &self.tenant_id)?,
            branch_code: decode_code(&self.branch_code)?,
            store_code: self.store_code,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct BranchRowWithId {
    record_id: String,
    tenant_id: String,
    branch_code: String,
    store_code: Option<String>,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BranchRowWithId {
    fn try_into_branch(self) -> Result<Branch, DbError> {
        let id = parse_uuid("branch", &self.record_id)?;
        BranchRow {
            tenant_id: self.tenant_id,
            branch_code: self.branch_code,
            store_code: self.store_code,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_branch(id)
    }
}

pub(crate) fn decode_code(raw: &str) -> Result<BranchCode, DbError> {
    BranchCode::parse(raw).map_err(|e| DbError::Decode(format!("branch.branch_code: {e}")))
}

#[derive(Clone)]
pub struct SurrealBranchRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealBranchRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn find_by_code(
        &self,
        tenant_id: Uuid,
        code: &BranchCode,
    ) -> Result<Option<Branch>, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM branch \
                 WHERE tenant_id = $tenant_id AND branch_code = $branch_code",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("branch_code", code.as_str().to_owned()))
            .await?;

        let rows: Vec<BranchRowWithId> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(BranchRowWithId::try_into_branch)
            .transpose()
    }
}

impl<C: Connection> BranchRepository for SurrealBranchRepository<C> {
    async fn create(&self, input: CreateBranch) -> FiligateResult<Branch> {
        if self
            .find_by_code(input.tenant_id, &input.branch_code)
            .await?
            .is_some()
        {
            return Err(DbError::AlreadyExists {
                entity: format!("branch {} in tenant {}", input.branch_code, input.tenant_id),
            }
            .into());
        }

        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('branch', $id) SET \
                 tenant_id = $tenant_id, branch_code = $branch_code, \
                 store_code = $store_code, description = $description",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("branch_code", String::from(input.branch_code)))
            .bind(("store_code", input.store_code))
            .bind(("description", input.description))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<BranchRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "branch".into(),
            id: id_str,
        })?;

        Ok(row.into_branch(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> FiligateResult<Branch> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('branch', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BranchRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "branch".into(),
            id: id_str,
        })?;

        Ok(row.into_branch(id)?)
    }

    async fn get_by_code(&self, tenant_id: Uuid, code: &BranchCode) -> FiligateResult<Branch> {
        self.find_by_code(tenant_id, code).await?.ok_or_else(|| {
            DbError::NotFound {
                entity: "branch".into(),
                id: format!("tenant={tenant_id},code={code}"),
            }
            .into()
        })
    }

    async fn list_by_tenant(&self, tenant_id: Uuid) -> FiligateResult<Vec<Branch>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM branch \
                 WHERE tenant_id = $tenant_id \
                 ORDER BY branch_code ASC",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BranchRowWithId> = result.take(0).map_err(DbError::from)?;
        let branches = rows
            .into_iter()
            .map(BranchRowWithId::try_into_branch)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(branches)
    }

    async fn delete(&self, id: Uuid) -> FiligateResult<()> {
        self.db
            .query("DELETE type::record('branch', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}
