//! Change summary.
//!
//! Human-readable account of what a reconciliation did to the watchlist.

use crate::core::{join_codes, StockCode};
use serde::{Deserialize, Serialize};

/// What changed in one run.
///
/// Every code list is sorted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    /// The list was cleared before adds and removes were applied
    pub cleared: bool,
    /// Codes requested for addition
    pub added: Vec<StockCode>,
    /// Codes actually removed
    pub removed: Vec<StockCode>,
    /// Codes requested for removal that were not in the list
    pub not_found: Vec<StockCode>,
}

impl ChangeSummary {
    /// Render as a chat reply using the transport's inline markup.
    pub fn to_text(&self) -> String {
        let mut output = if self.cleared {
            String::from("<b>Watchlist cleared.</b>")
        } else {
            String::from("<b>Watchlist updated.</b>")
        };

        if !self.added.is_empty() {
            output.push_str(&format!("\nadded: {}", join_codes(&self.added)));
        }
        if !self.removed.is_empty() {
            output.push_str(&format!("\nremoved: {}", join_codes(&self.removed)));
        }
        if !self.not_found.is_empty() {
            output.push_str(&format!("\nnot found: {}", join_codes(&self.not_found)));
        }

        output
    }

    /// Render as JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl std::fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(list: &[&str]) -> Vec<StockCode> {
        list.iter().map(|s| StockCode::parse(s).unwrap()).collect()
    }

    #[test]
    fn test_updated_summary() {
        let summary = ChangeSummary {
            added: codes(&["600519"]),
            ..Default::default()
        };
        assert_eq!(summary.to_text(), "<b>Watchlist updated.</b>\nadded: 600519");
    }

    #[test]
    fn test_cleared_summary() {
        let summary = ChangeSummary {
            cleared: true,
            ..Default::default()
        };
        assert_eq!(summary.to_text(), "<b>Watchlist cleared.</b>");
    }

    #[test]
    fn test_full_summary() {
        let summary = ChangeSummary {
            cleared: false,
            added: codes(&["000001", "600519"]),
            removed: codes(&["600001"]),
            not_found: codes(&["600002", "600003"]),
        };
        let text = summary.to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "<b>Watchlist updated.</b>",
                "added: 000001, 600519",
                "removed: 600001",
                "not found: 600002, 600003",
            ]
        );
    }

    #[test]
    fn test_json() {
        let summary = ChangeSummary {
            removed: codes(&["600001"]),
            ..Default::default()
        };
        assert!(summary.to_json().contains("\"removed\":[\"600001\"]"));
    }
}
