//! Spreadsheet boundary and incremental export.
//!
//! - [`SheetStore`] -- the operations the exporter needs from a spreadsheet.
//! - [`GoogleSheetsStore`] -- Google Sheets v4 over REST with
//!   service-account authentication.
//! - [`MemorySheetStore`] -- in-process store with failure injection.
//! - [`IncrementalExporter`] -- watermark-filtered, partitioned append.

pub mod error;
pub mod exporter;
pub mod google;
pub mod memory;
pub mod store;

pub use error::{ExportError, SheetError};
pub use exporter::{ExportOutcome, IncrementalExporter};
pub use google::GoogleSheetsStore;
pub use memory::MemorySheetStore;
pub use store::{CellRef, SheetStore};
