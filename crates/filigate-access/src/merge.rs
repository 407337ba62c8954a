//! Request filter parsing and the final branch filter.
//!
//! | allowed        | requested | filter                         |
//! |----------------|-----------|--------------------------------|
//! | Unrestricted   | All       | Unfiltered                     |
//! | Unrestricted   | R         | Only(R)                        |
//! | Restricted(A)  | All       | Only(A)                        |
//! | Restricted(A)  | R         | Only(A ∩ R), or Only(A) if ∅   |
//!
//! The last row's fallback is deliberate: asking for branches outside the
//! allowed set widens back to the whole allowed set instead of failing or
//! returning nothing.

use std::collections::BTreeSet;

use filigate_core::models::branch::BranchCode;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::AccessConfig;
use crate::scope::AllowedBranches;

const ALL_SENTINEL: &str = "all";

/// Branch selection carried on a request, e.g. `filiais=1,4,7`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestedBranches {
    All,
    Codes(BTreeSet<BranchCode>),
}

impl RequestedBranches {
    /// Parse a raw comma-separated list.
    ///
    /// Absent, blank or `all` selects everything. Invalid tokens are
    /// dropped; a list with no usable token also selects everything.
    /// At most `config.max_requested_branches` distinct codes are kept,
    /// in the order they first appear.
    pub fn parse(raw: Option<&str>, config: &AccessConfig) -> Self {
        let Some(raw) = raw.map(str::trim) else {
            return RequestedBranches::All;
        };
        if raw.is_empty() || raw.eq_ignore_ascii_case(ALL_SENTINEL) {
            return RequestedBranches::All;
        }

        let mut codes = BTreeSet::new();
        let mut dropped = 0usize;
        let mut truncated = false;
        for token in raw.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            match BranchCode::parse(token) {
                Ok(code) => {
                    if codes.contains(&code) {
                        continue;
                    }
                    if codes.len() >= config.max_requested_branches {
                        truncated = true;
                        break;
                    }
                    codes.insert(code);
                }
                Err(_) => dropped += 1,
            }
        }

        if dropped > 0 {
            debug!(dropped, "ignored malformed branch codes in request");
        }
        if truncated {
            warn!(
                limit = config.max_requested_branches,
                "requested branch list truncated"
            );
        }

        if codes.is_empty() {
            RequestedBranches::All
        } else {
            RequestedBranches::Codes(codes)
        }
    }
}

/// The branch condition to apply to tenant-scoped queries.
///
/// Serializes as `null` for [`Unfiltered`](Self::Unfiltered) and as an
/// array of codes otherwise. `Only` with an empty set matches no rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BranchFilter {
    Unfiltered,
    Only(BTreeSet<BranchCode>),
}

impl BranchFilter {
    /// The codes to filter on, or `None` when no filter applies.
    pub fn codes(&self) -> Option<&BTreeSet<BranchCode>> {
        match self {
            BranchFilter::Unfiltered => None,
            BranchFilter::Only(codes) => Some(codes),
        }
    }

    pub fn allows(&self, code: &BranchCode) -> bool {
        match self {
            BranchFilter::Unfiltered => true,
            BranchFilter::Only(codes) => codes.contains(code),
        }
    }

    /// True when the filter cannot match any branch.
    pub fn is_empty(&self) -> bool {
        matches!(self, BranchFilter::Only(codes) if codes.is_empty())
    }
}

pub fn merge_scope(allowed: &AllowedBranches, requested: &RequestedBranches) -> BranchFilter {
    match (allowed, requested) {
        (AllowedBranches::Unrestricted, RequestedBranches::All) => BranchFilter::Unfiltered,
        (AllowedBranches::Unrestricted, RequestedBranches::Codes(r)) => {
            BranchFilter::Only(r.clone())
        }
        (AllowedBranches::Restricted(a), RequestedBranches::All) => BranchFilter::Only(a.clone()),
        (AllowedBranches::Restricted(a), RequestedBranches::Codes(r)) => {
            let both: BTreeSet<BranchCode> = a.intersection(r).cloned().collect();
            if both.is_empty() {
                debug!(
                    requested = r.len(),
                    allowed = a.len(),
                    "requested branches outside allowed set, using allowed set"
                );
                BranchFilter::Only(a.clone())
            } else {
                BranchFilter::Only(both)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(raw: &[&str]) -> BTreeSet<BranchCode> {
        raw.iter().map(|c| BranchCode::parse(c).unwrap()).collect()
    }

    fn parse(raw: Option<&str>) -> RequestedBranches {
        RequestedBranches::parse(raw, &AccessConfig::default())
    }

    // -------------------------------------------------------------------
    // Parsing
    // -------------------------------------------------------------------

    #[test]
    fn absent_blank_and_sentinel_mean_all() {
        for raw in [None, Some(""), Some("   "), Some("all"), Some(" ALL "), Some("All")] {
            assert_eq!(parse(raw), RequestedBranches::All, "{raw:?}");
        }
    }

    #[test]
    fn splits_trims_and_deduplicates() {
        assert_eq!(
            parse(Some(" 1, 4 ,7,4")),
            RequestedBranches::Codes(codes(&["1", "4", "7"]))
        );
    }

    #[test]
    fn unusable_list_means_all() {
        assert_eq!(parse(Some(",, ,")), RequestedBranches::All);
        let overlong = "9".repeat(40);
        assert_eq!(parse(Some(&overlong)), RequestedBranches::All);
    }

    #[test]
    fn invalid_tokens_are_dropped() {
        let raw = format!("3,{},5", "x".repeat(30));
        assert_eq!(parse(Some(&raw)), RequestedBranches::Codes(codes(&["3", "5"])));
    }

    #[test]
    fn truncates_to_configured_limit() {
        let config = AccessConfig {
            max_requested_branches: 2,
        };
        assert_eq!(
            RequestedBranches::parse(Some("5,5,6,7,8"), &config),
            RequestedBranches::Codes(codes(&["5", "6"]))
        );
    }

    // -------------------------------------------------------------------
    // Merge table
    // -------------------------------------------------------------------

    #[test]
    fn unrestricted_all_is_unfiltered() {
        let filter = merge_scope(&AllowedBranches::Unrestricted, &RequestedBranches::All);
        assert_eq!(filter, BranchFilter::Unfiltered);
        assert_eq!(filter.codes(), None);
    }

    #[test]
    fn unrestricted_trusts_explicit_request() {
        let requested = RequestedBranches::Codes(codes(&["3", "7"]));
        assert_eq!(
            merge_scope(&AllowedBranches::Unrestricted, &requested),
            BranchFilter::Only(codes(&["3", "7"]))
        );
    }

    #[test]
    fn restricted_all_is_allowed_set() {
        let allowed = AllowedBranches::Restricted(codes(&["1", "4"]));
        assert_eq!(
            merge_scope(&allowed, &RequestedBranches::All),
            BranchFilter::Only(codes(&["1", "4"]))
        );
    }

    #[test]
    fn restricted_disjoint_request_falls_back_to_allowed_set() {
        let allowed = AllowedBranches::Restricted(codes(&["1", "4"]));
        let requested = RequestedBranches::Codes(codes(&["9"]));
        assert_eq!(
            merge_scope(&allowed, &requested),
            BranchFilter::Only(codes(&["1", "4"]))
        );
    }

    #[test]
    fn restricted_overlapping_request_is_intersected() {
        let allowed = AllowedBranches::Restricted(codes(&["1", "4"]));
        let requested = RequestedBranches::Codes(codes(&["4", "9"]));
        assert_eq!(
            merge_scope(&allowed, &requested),
            BranchFilter::Only(codes(&["4"]))
        );
    }

    #[test]
    fn empty_restriction_stays_empty() {
        let allowed = AllowedBranches::Restricted(BTreeSet::new());
        for requested in [
            RequestedBranches::All,
            RequestedBranches::Codes(codes(&["1"])),
        ] {
            let filter = merge_scope(&allowed, &requested);
            assert!(filter.is_empty());
            assert!(!filter.allows(&BranchCode::parse("1").unwrap()));
            assert_eq!(filter.codes().map(BTreeSet::len), Some(0));
        }
    }

    #[test]
    fn filter_serializes_as_null_or_array() {
        assert_eq!(
            serde_json::to_value(BranchFilter::Unfiltered).unwrap(),
            serde_json::Value::Null
        );
        assert_eq!(
            serde_json::to_value(BranchFilter::Only(codes(&["4", "1"]))).unwrap(),
            serde_json::json!(["1", "4"])
        );
    }
}
