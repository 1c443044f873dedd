//! Bulk reconciliation between the member store and spreadsheets.

pub mod change;
pub mod columns;
pub mod export;
pub mod import;

pub use change::{apply_bulk_change, BulkChangeReport, BulkChangeRequest};
pub use export::export_members;
pub use import::{apply_rows, parse_workbook, ApplyReport, ImportRow};
