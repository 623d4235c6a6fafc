//! Reply rendering.
//!
//! - Change summary for mutating runs
//! - Snapshot for view requests

pub mod summary;
pub mod view;

pub use summary::ChangeSummary;
pub use view::{render_snapshot, render_view};
