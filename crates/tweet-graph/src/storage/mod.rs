//! Persistence collaborators.
//!
//! Raw response pages are archived one document per page; normalized tables
//! are written as numbered snapshots.

mod pages;
mod tables;

pub use pages::{list_pages, read_page, PageArchive};
pub use tables::{JsonTableSink, TableFormat, TableSink};
