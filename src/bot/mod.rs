//! Bot runner.
//!
//! Wires transport, extractor, reconciliation and store into one run.

pub mod runner;

pub use runner::{RunReport, WatchlistBot};
