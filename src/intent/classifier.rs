//! Keyword classifier.
//!
//! Maps message text to intents with a fixed, ordered set of
//! case-insensitive patterns. Mutation rules are tried in priority order and
//! the first match wins; Add is the fallback when codes are present. View is
//! checked separately on every message.

use crate::core::{Result, StockCode};
use crate::intent::message::Intent;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Built-in delete keywords.
pub const REMOVE_KEYWORDS: &str = "删除|移除|del|delete|rm|remove";
/// Built-in clear keywords.
pub const CLEAR_KEYWORDS: &str = "清空|clear";
/// Built-in view keywords. `view` and `query` must stand alone so words
/// like "review" do not trigger a snapshot.
pub const VIEW_KEYWORDS: &str = r"查看|查询|列表|\bview\b|list|\bquery\b|ls|cx";

/// Mutation produced by a keyword rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationKind {
    /// Every code in the message is a removal target
    Remove,
    /// Drop the whole list
    Clear,
}

/// Keyword alternations used to build a classifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordSet {
    /// Delete keywords, `|`-separated
    pub remove: String,
    /// Clear keywords, `|`-separated
    pub clear: String,
    /// View keywords, `|`-separated
    pub view: String,
}

impl Default for KeywordSet {
    fn default() -> Self {
        Self {
            remove: REMOVE_KEYWORDS.to_string(),
            clear: CLEAR_KEYWORDS.to_string(),
            view: VIEW_KEYWORDS.to_string(),
        }
    }
}

/// A compiled `(pattern, kind)` pair.
#[derive(Clone, Debug)]
pub struct KeywordRule {
    /// Mutation emitted on match
    pub kind: MutationKind,
    pattern: Regex,
}

impl KeywordRule {
    /// Compile a case-insensitive rule from a keyword alternation.
    pub fn new(kind: MutationKind, keywords: &str) -> Result<Self> {
        Ok(Self {
            kind,
            pattern: case_insensitive(keywords)?,
        })
    }

    /// Check whether the rule fires on some text.
    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// Pure text classifier.
#[derive(Clone, Debug)]
pub struct KeywordClassifier {
    rules: Vec<KeywordRule>,
    view: Regex,
    digits: Regex,
}

impl KeywordClassifier {
    /// Build a classifier from keyword alternations.
    ///
    /// Rule priority is Remove, then Clear.
    pub fn new(keywords: &KeywordSet) -> Result<Self> {
        Ok(Self {
            rules: vec![
                KeywordRule::new(MutationKind::Remove, &keywords.remove)?,
                KeywordRule::new(MutationKind::Clear, &keywords.clear)?,
            ],
            view: case_insensitive(&keywords.view)?,
            digits: Regex::new("[0-9]{6}")?,
        })
    }

    /// Build the classifier with the built-in keywords.
    pub fn with_defaults() -> Self {
        Self::new(&KeywordSet::default()).expect("built-in keyword patterns compile")
    }

    /// Collect six-digit codes, scanning left to right.
    ///
    /// Matches do not overlap, so a longer run yields one code per complete
    /// six-digit chunk and drops the remainder.
    pub fn extract_codes(&self, text: &str) -> BTreeSet<StockCode> {
        self.digits
            .find_iter(text)
            .filter_map(|m| StockCode::parse(m.as_str()).ok())
            .collect()
    }

    /// First mutation rule matching the text, if any.
    pub fn mutation(&self, text: &str) -> Option<MutationKind> {
        self.rules
            .iter()
            .find(|rule| rule.matches(text))
            .map(|rule| rule.kind)
    }

    /// Whether the text asks for a snapshot.
    pub fn wants_view(&self, text: &str) -> bool {
        self.view.is_match(text)
    }

    /// Classify message text into intents.
    ///
    /// At most one mutation intent is produced, followed by View when the
    /// view pattern matches.
    pub fn classify(&self, text: &str) -> Vec<Intent> {
        let codes = self.extract_codes(text);
        let mut intents = Vec::new();

        match self.mutation(text) {
            Some(MutationKind::Remove) => {
                if !codes.is_empty() {
                    intents.push(Intent::Remove(codes));
                }
            }
            Some(MutationKind::Clear) => intents.push(Intent::Clear),
            None => {
                if !codes.is_empty() {
                    intents.push(Intent::Add(codes));
                }
            }
        }

        if self.wants_view(text) {
            intents.push(Intent::View);
        }

        intents
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn case_insensitive(keywords: &str) -> Result<Regex> {
    Ok(Regex::new(&format!("(?i)({})", keywords))?)
}
