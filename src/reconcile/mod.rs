//! Set reconciliation.
//!
//! Folds a batch of extracted intents and applies it to the persisted
//! watchlist.

pub mod batch;
pub mod engine;

pub use batch::BatchResult;
pub use engine::{reconcile, Reconciliation};
