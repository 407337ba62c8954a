//! Schema definitions and migration runner for SurrealDB.
//!
//! All tables are SCHEMAFULL. UUIDs are stored as strings and enums as
//! strings with ASSERT constraints.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "access_control_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Tenants (global scope)
-- =======================================================================
DEFINE TABLE tenant SCHEMAFULL;
DEFINE FIELD name ON TABLE tenant TYPE string;
DEFINE FIELD schema_name ON TABLE tenant TYPE string \
    ASSERT $value = /^[a-z0-9_]+$/;
DEFINE FIELD is_active ON TABLE tenant TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_tenant_schema_name ON TABLE tenant \
    COLUMNS schema_name UNIQUE;

-- =======================================================================
-- Profiles (record id = identity-provider id)
-- =======================================================================
DEFINE TABLE profile SCHEMAFULL;
DEFINE FIELD role ON TABLE profile TYPE string \
    ASSERT $value IN ['superadmin', 'admin', 'user', 'viewer'];
DEFINE FIELD tenant_id ON TABLE profile TYPE option<string>;
DEFINE FIELD can_switch_tenants ON TABLE profile TYPE bool DEFAULT false;
DEFINE FIELD is_active ON TABLE profile TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE profile TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE profile TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_profile_tenant ON TABLE profile COLUMNS tenant_id;

-- =======================================================================
-- Branches (tenant scope)
-- =======================================================================
DEFINE TABLE branch SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE branch TYPE string;
DEFINE FIELD branch_code ON TABLE branch TYPE string;
DEFINE FIELD store_code ON TABLE branch TYPE option<string>;
DEFINE FIELD description ON TABLE branch TYPE option<string>;
DEFINE FIELD created_at ON TABLE branch TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE branch TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_branch_tenant_code ON TABLE branch \
    COLUMNS tenant_id, branch_code UNIQUE;

-- =======================================================================
-- Branch restrictions
-- =======================================================================
-- Plain table, not an edge: rows must survive deletion of the branch
-- they name.
DEFINE TABLE branch_grant SCHEMAFULL;
DEFINE FIELD identity_id ON TABLE branch_grant TYPE string;
DEFINE FIELD branch_id ON TABLE branch_grant TYPE string;
DEFINE FIELD granted_by ON TABLE branch_grant TYPE option<string>;
DEFINE FIELD granted_at ON TABLE branch_grant TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_branch_grant_pair ON TABLE branch_grant \
    COLUMNS identity_id, branch_id UNIQUE;

-- =======================================================================
-- Graph Edge Tables (relations)
-- =======================================================================

-- Profile -> Tenant cross-tenant grant
DEFINE TABLE has_tenant_access TYPE RELATION SCHEMAFULL;
DEFINE FIELD granted_by ON TABLE has_tenant_access TYPE option<string>;
DEFINE FIELD granted_at ON TABLE has_tenant_access TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_tenant_access_pair ON TABLE has_tenant_access \
    COLUMNS in, out UNIQUE;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS.iter().filter(|m| m.version > current_version) {
        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        db.query(migration.sql).await?.check().map_err(|e| {
            DbError::Migration(format!(
                "v{} '{}': {}",
                migration.version, migration.name, e,
            ))
        })?;

        db.query("CREATE _migration SET version = $version, name = $name")
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "recording v{}: {}",
                    migration.version, e,
                ))
            })?;
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(window[0].version < window[1].version);
        }
    }

    #[test]
    fn schema_defines_every_store() {
        for table in [
            "DEFINE TABLE tenant",
            "DEFINE TABLE profile",
            "DEFINE TABLE branch ",
            "DEFINE TABLE branch_grant",
            "DEFINE TABLE has_tenant_access TYPE RELATION",
        ] {
            assert!(SCHEMA_V1.contains(table), "missing `{table}`");
        }
    }
}
