//! Common types used across stockwatch modules.

use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Number of digits in a stock code.
pub const STOCK_CODE_LEN: usize = 6;

/// A six-digit stock ticker code.
///
/// Equality is exact string match, leading zeros included. Ordering is
/// lexicographic on the digit string, which is also numeric order since the
/// length is fixed.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StockCode(String);

impl StockCode {
    /// Parse a stock code, rejecting anything that is not exactly six ASCII digits.
    pub fn parse(s: &str) -> Result<Self> {
        if Self::is_valid(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(Error::InvalidStockCode(s.to_string()))
        }
    }

    /// Check whether a string has the shape of a stock code.
    pub fn is_valid(s: &str) -> bool {
        s.len() == STOCK_CODE_LEN && s.bytes().all(|b| b.is_ascii_digit())
    }

    /// Get the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StockCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for StockCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for StockCode {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        if Self::is_valid(&s) {
            Ok(Self(s))
        } else {
            Err(Error::InvalidStockCode(s))
        }
    }
}

impl From<StockCode> for String {
    fn from(code: StockCode) -> Self {
        code.0
    }
}

/// The persisted set of monitored stock codes.
///
/// Backed by an ordered set so every iteration, and therefore every
/// rendering, is sorted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Watchlist(BTreeSet<StockCode>);

impl Watchlist {
    /// Create an empty watchlist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of codes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list has no codes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Membership test.
    pub fn contains(&self, code: &StockCode) -> bool {
        self.0.contains(code)
    }

    /// Insert a code. Returns false if it was already present.
    pub fn insert(&mut self, code: StockCode) -> bool {
        self.0.insert(code)
    }

    /// Remove a code. Returns false if it was not present.
    pub fn remove(&mut self, code: &StockCode) -> bool {
        self.0.remove(code)
    }

    /// Iterate codes in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &StockCode> {
        self.0.iter()
    }

    /// Borrow the underlying set.
    pub fn as_set(&self) -> &BTreeSet<StockCode> {
        &self.0
    }
}

impl From<BTreeSet<StockCode>> for Watchlist {
    fn from(set: BTreeSet<StockCode>) -> Self {
        Self(set)
    }
}

impl FromIterator<StockCode> for Watchlist {
    fn from_iter<I: IntoIterator<Item = StockCode>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Watchlist {
    type Item = &'a StockCode;
    type IntoIter = std::collections::btree_set::Iter<'a, StockCode>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Join codes with ", " in the order given.
pub fn join_codes<'a>(codes: impl IntoIterator<Item = &'a StockCode>) -> String {
    codes
        .into_iter()
        .map(StockCode::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Timestamp wrapper for consistent serialization.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Get current UTC timestamp.
pub fn now() -> Timestamp {
    chrono::Utc::now()
}
