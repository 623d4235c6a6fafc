//! Reconciliation engine.
//!
//! Applies a folded batch to the persisted watchlist with a fixed
//! precedence: clear, then add, then remove. Add therefore survives a clear
//! in the same batch, and remove beats add for the same code.

use crate::core::{StockCode, Watchlist};
use crate::reconcile::batch::BatchResult;
use crate::report::ChangeSummary;
use serde::{Deserialize, Serialize};

/// Outcome of reconciling one batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// The new watchlist
    pub watchlist: Watchlist,
    /// What changed (None when nothing was requested)
    pub summary: Option<ChangeSummary>,
    /// Whether any mutation was requested
    pub changed: bool,
}

/// Reconcile an existing watchlist with a batch.
///
/// `changed` is true whenever a clear, add or remove was requested, even if
/// every removal missed and the resulting list equals the existing one.
pub fn reconcile(existing: &Watchlist, batch: &BatchResult) -> Reconciliation {
    if !batch.has_mutation() {
        return Reconciliation {
            watchlist: existing.clone(),
            summary: None,
            changed: false,
        };
    }

    let mut watchlist = if batch.clear_requested {
        Watchlist::new()
    } else {
        existing.clone()
    };

    for code in &batch.codes_to_add {
        watchlist.insert(code.clone());
    }

    let mut removed: Vec<StockCode> = Vec::new();
    let mut not_found: Vec<StockCode> = Vec::new();
    for code in &batch.codes_to_remove {
        if watchlist.remove(code) {
            removed.push(code.clone());
        } else {
            not_found.push(code.clone());
        }
    }

    let summary = ChangeSummary {
        cleared: batch.clear_requested,
        added: batch.codes_to_add.iter().cloned().collect(),
        removed,
        not_found,
    };

    Reconciliation {
        watchlist,
        summary: Some(summary),
        changed: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn code(s: &str) -> StockCode {
        StockCode::parse(s).unwrap()
    }

    fn set(list: &[&str]) -> BTreeSet<StockCode> {
        list.iter().map(|s| code(s)).collect()
    }

    fn list(codes: &[&str]) -> Watchlist {
        codes.iter().map(|s| code(s)).collect()
    }

    #[test]
    fn test_no_mutation_keeps_list() {
        let existing = list(&["600001"]);
        let batch = BatchResult {
            view_requested: true,
            ..Default::default()
        };
        let result = reconcile(&existing, &batch);

        assert!(!result.changed);
        assert!(result.summary.is_none());
        assert_eq!(result.watchlist, existing);
    }

    #[test]
    fn test_add() {
        let batch = BatchResult {
            codes_to_add: set(&["600519"]),
            ..Default::default()
        };
        let result = reconcile(&list(&["600001", "600002"]), &batch);

        assert!(result.changed);
        assert_eq!(result.watchlist, list(&["600001", "600002", "600519"]));
        assert_eq!(result.summary.unwrap().added, vec![code("600519")]);
    }

    #[test]
    fn test_remove_reports_missing() {
        let batch = BatchResult {
            codes_to_remove: set(&["600001", "600002"]),
            ..Default::default()
        };
        let result = reconcile(&list(&["600001"]), &batch);
        let summary = result.summary.unwrap();

        assert!(result.watchlist.is_empty());
        assert_eq!(summary.removed, vec![code("600001")]);
        assert_eq!(summary.not_found, vec![code("600002")]);
    }

    #[test]
    fn test_failed_removal_still_changed() {
        let existing = list(&["600001"]);
        let batch = BatchResult {
            codes_to_remove: set(&["600009"]),
            ..Default::default()
        };
        let result = reconcile(&existing, &batch);

        assert!(result.changed);
        assert_eq!(result.watchlist, existing);
        let summary = result.summary.unwrap();
        assert!(summary.removed.is_empty());
        assert_eq!(summary.not_found, vec![code("600009")]);
    }

    #[test]
    fn test_add_survives_clear() {
        let batch = BatchResult {
            clear_requested: true,
            codes_to_add: set(&["600519", "000001"]),
            ..Default::default()
        };
        let result = reconcile(&list(&["600001", "600519"]), &batch);

        assert_eq!(result.watchlist, list(&["000001", "600519"]));
        assert!(result.summary.unwrap().cleared);
    }

    #[test]
    fn test_remove_wins_over_add() {
        let batch = BatchResult {
            codes_to_add: set(&["600519"]),
            codes_to_remove: set(&["600519"]),
            ..Default::default()
        };
        let result = reconcile(&Watchlist::new(), &batch);

        assert!(!result.watchlist.contains(&code("600519")));
        let summary = result.summary.unwrap();
        assert_eq!(summary.added, vec![code("600519")]);
        assert_eq!(summary.removed, vec![code("600519")]);
    }

    #[test]
    fn test_clear_only() {
        let batch = BatchResult {
            clear_requested: true,
            ..Default::default()
        };
        let result = reconcile(&list(&["600001"]), &batch);

        assert!(result.changed);
        assert!(result.watchlist.is_empty());
        assert_eq!(result.summary.unwrap().to_text(), "<b>Watchlist cleared.</b>");
    }

    #[test]
    fn test_removal_after_clear_is_not_found() {
        let batch = BatchResult {
            clear_requested: true,
            codes_to_remove: set(&["600001"]),
            ..Default::default()
        };
        let result = reconcile(&list(&["600001"]), &batch);
        assert_eq!(result.summary.unwrap().not_found, vec![code("600001")]);
    }
}
