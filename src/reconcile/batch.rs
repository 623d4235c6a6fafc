//! Batch folding.
//!
//! Collapses the extractions of a whole batch into sets and flags. The fold
//! only uses set union, logical or and max, so the result does not depend on
//! the order messages were retrieved in.

use crate::core::StockCode;
use crate::intent::{Extraction, Intent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Fold of every intent in a batch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Union of all Add targets
    pub codes_to_add: BTreeSet<StockCode>,
    /// Union of all Remove targets
    pub codes_to_remove: BTreeSet<StockCode>,
    /// Any message asked to clear
    pub clear_requested: bool,
    /// Any message asked for a snapshot
    pub view_requested: bool,
    /// Highest order id seen, filtered messages included
    pub max_order_id: Option<i64>,
    /// Number of messages folded
    pub messages: usize,
    /// Number of messages rejected by a filter
    pub rejected: usize,
    /// Sender of the highest-ordered accepted message
    pub latest_sender: Option<String>,
    #[serde(skip)]
    pub(crate) latest_accepted_order: Option<i64>,
}

impl BatchResult {
    /// Create an empty batch result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a sequence of extractions.
    pub fn from_extractions<'a>(extractions: impl IntoIterator<Item = &'a Extraction>) -> Self {
        let mut batch = Self::new();
        for extraction in extractions {
            batch.absorb(extraction);
        }
        batch
    }

    /// Fold one extraction into the batch.
    pub fn absorb(&mut self, extraction: &Extraction) {
        self.messages += 1;
        self.max_order_id = Some(
            self.max_order_id
                .map_or(extraction.order_id, |max| max.max(extraction.order_id)),
        );

        if !extraction.accepted() {
            self.rejected += 1;
            return;
        }

        if self
            .latest_accepted_order
            .map_or(true, |order| extraction.order_id > order)
        {
            self.latest_accepted_order = Some(extraction.order_id);
            self.latest_sender = Some(extraction.sender_id.clone());
        }

        for intent in &extraction.intents {
            self.apply(intent);
        }
    }

    /// Fold one intent into the batch.
    pub fn apply(&mut self, intent: &Intent) {
        match intent {
            Intent::Add(codes) => self.codes_to_add.extend(codes.iter().cloned()),
            Intent::Remove(codes) => self.codes_to_remove.extend(codes.iter().cloned()),
            Intent::Clear => self.clear_requested = true,
            Intent::View => self.view_requested = true,
        }
    }

    /// Whether any intent in the batch changes the watchlist.
    pub fn has_mutation(&self) -> bool {
        self.clear_requested || !self.codes_to_add.is_empty() || !self.codes_to_remove.is_empty()
    }

    /// Whether the batch needs any action at all.
    pub fn is_noop(&self) -> bool {
        !self.has_mutation() && !self.view_requested
    }
}
