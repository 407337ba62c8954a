//! Branch ("filial") domain model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FiligateError, FiligateResult};

pub const MAX_BRANCH_CODE_LEN: usize = 20;

/// Externally visible branch identifier, unique within a tenant.
///
/// Codes are what dashboards put in query strings (`filiais=1,4,7`), so
/// they may not contain separators or whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchCode(String);

impl BranchCode {
    pub fn parse(raw: &str) -> FiligateResult<Self> {
        let code = raw.trim();
        if code.is_empty() {
            return Err(FiligateError::validation("branch code is empty"));
        }
        if code.chars().count() > MAX_BRANCH_CODE_LEN {
            return Err(FiligateError::validation(format!(
                "branch code exceeds {MAX_BRANCH_CODE_LEN} characters"
            )));
        }
        if code.chars().any(|c| c == ',' || c.is_whitespace() || c.is_control()) {
            return Err(FiligateError::validation(
                "branch code contains a separator or whitespace",
            ));
        }
        Ok(Self(code.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for BranchCode {
    type Error = FiligateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BranchCode> for String {
    fn from(value: BranchCode) -> Self {
        value.0
    }
}

/// A retail location. Belongs to exactly one tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub branch_code: BranchCode,
    /// Store code used by the point-of-sale feed, if different.
    pub store_code: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBranch {
    pub tenant_id: Uuid,
    pub branch_code: BranchCode,
    pub store_code: Option<String>,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(BranchCode::parse(" 7 ").unwrap().as_str(), "7");
    }

    #[test]
    fn rejects_empty_separators_and_overlong() {
        assert!(BranchCode::parse("").is_err());
        assert!(BranchCode::parse("   ").is_err());
        assert!(BranchCode::parse("1,2").is_err());
        assert!(BranchCode::parse("1 2").is_err());
        assert!(BranchCode::parse(&"9".repeat(MAX_BRANCH_CODE_LEN + 1)).is_err());
        assert!(BranchCode::parse(&"9".repeat(MAX_BRANCH_CODE_LEN)).is_ok());
    }

    #[test]
    fn codes_order_lexically() {
        let mut codes = vec![
            BranchCode::parse("4").unwrap(),
            BranchCode::parse("1").unwrap(),
            BranchCode::parse("10").unwrap(),
        ];
        codes.sort();
        let strs: Vec<&str> = codes.iter().map(BranchCode::as_str).collect();
        assert_eq!(strs, ["1", "10", "4"]);
    }
}
