//! Tenant domain model.
//!
//! A tenant is one retail company. Its sales, inventory and goal data
//! live in a dedicated logical schema whose name is stored here.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FiligateError, FiligateResult};

/// Longest schema name accepted (PostgreSQL identifier limit).
pub const MAX_SCHEMA_NAME_LEN: usize = 63;

/// A syntactically valid schema name: `^[a-z0-9_]+$`.
///
/// Construction is the only way to obtain one, so anything holding a
/// `SchemaName` can be handed to the data layer without further escaping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaName(String);

impl SchemaName {
    pub fn parse(raw: &str) -> FiligateResult<Self> {
        if raw.is_empty() {
            return Err(FiligateError::validation("schema name is empty"));
        }
        if raw.len() > MAX_SCHEMA_NAME_LEN {
            return Err(FiligateError::validation(format!(
                "schema name exceeds {MAX_SCHEMA_NAME_LEN} bytes"
            )));
        }
        let valid = raw
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_');
        if !valid {
            return Err(FiligateError::validation(
                "schema name must match ^[a-z0-9_]+$",
            ));
        }
        Ok(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SchemaName {
    type Error = FiligateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SchemaName> for String {
    fn from(value: SchemaName) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    /// Human-readable company name.
    pub name: String,
    /// Logical data schema owned by this tenant. Unique across tenants.
    pub schema_name: SchemaName,
    /// Inactive tenants are never reachable through the schema gate.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    pub name: String,
    pub schema_name: SchemaName,
}

/// Fields that can be updated on an existing tenant.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateTenant {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_lowercase_digits_and_underscore() {
        for name in ["okilao", "saoluiz_2", "_", "a1_b2_c3"] {
            assert!(SchemaName::parse(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_malformed_names() {
        for name in [
            "",
            "Okilao",
            "oki-lao",
            "oki lao",
            "public; drop table x",
            "\"quoted\"",
            "sch\u{e9}ma",
        ] {
            assert!(
                matches!(
                    SchemaName::parse(name),
                    Err(FiligateError::Validation { .. })
                ),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_overlong_names() {
        let long = "a".repeat(MAX_SCHEMA_NAME_LEN + 1);
        assert!(SchemaName::parse(&long).is_err());
        let max = "a".repeat(MAX_SCHEMA_NAME_LEN);
        assert!(SchemaName::parse(&max).is_ok());
    }

    #[test]
    fn deserialization_validates() {
        let ok: SchemaName = serde_json::from_str("\"okilao\"").unwrap();
        assert_eq!(ok.as_str(), "okilao");
        assert!(serde_json::from_str::<SchemaName>("\"Bad-Name\"").is_err());
    }
}
