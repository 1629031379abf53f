//! Inputs supplied by the page-interaction side of a scrape run: the history page
//! itself and the network responses observed while it loaded.

pub mod har;
pub mod page;

pub use har::{load_har, replay};
pub use page::{scroll_to_load_more, HistoryPage, SnapshotPage};
