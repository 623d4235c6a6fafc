//! Store backend implementations.
//!
//! Three pluggable backends:
//! - File (one code per line)
//! - Sheet (Google spreadsheet)
//! - Memory

pub mod file;
pub mod memory;
pub mod sheet;

pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use sheet::{mirror_rows, rows_from_values, values_from_rows, SheetBackend, SheetRow, Upsert};
