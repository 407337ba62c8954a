//! Access decision error types.
//!
//! Every refusal collapses into [`AccessError::Denied`]; the reason is
//! logged but never returned. Store failures stay distinguishable so
//! callers can answer with a retryable error instead of a 403.

use filigate_core::error::FiligateError;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("access denied")]
    Denied,

    #[error("access store unavailable: {0}")]
    Unavailable(String),
}

impl AccessError {
    pub fn is_denied(&self) -> bool {
        matches!(self, AccessError::Denied)
    }
}

/// Log the internal reason for a refusal and return the opaque error.
pub(crate) fn denied(identity_id: Uuid, reason: &'static str) -> AccessError {
    debug!(%identity_id, reason, "access denied");
    AccessError::Denied
}

impl From<FiligateError> for AccessError {
    fn from(err: FiligateError) -> Self {
        match err {
            FiligateError::NotFound { .. }
            | FiligateError::AlreadyExists { .. }
            | FiligateError::Validation { .. }
            | FiligateError::AccessDenied => AccessError::Denied,
            FiligateError::Database(msg) | FiligateError::Internal(msg) => {
                warn!(error = %msg, "access store lookup failed");
                AccessError::Unavailable(msg)
            }
        }
    }
}

impl From<AccessError> for FiligateError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Denied => FiligateError::AccessDenied,
            AccessError::Unavailable(msg) => FiligateError::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_misses_collapse_to_denied() {
        let cases = [
            FiligateError::not_found("profile", "x"),
            FiligateError::validation("bad schema"),
            FiligateError::AccessDenied,
            FiligateError::AlreadyExists {
                entity: "grant".into(),
            },
        ];
        for err in cases {
            assert!(AccessError::from(err).is_denied());
        }
    }

    #[test]
    fn store_failures_stay_distinct() {
        let err = AccessError::from(FiligateError::Database("timeout".into()));
        assert!(matches!(err, AccessError::Unavailable(ref m) if m == "timeout"));
        assert!(!err.is_denied());
    }

    #[test]
    fn denied_message_carries_no_detail() {
        assert_eq!(AccessError::Denied.to_string(), "access denied");
    }
}
