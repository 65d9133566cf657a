//! Result types returned by a connector
//!
//! A [`ResultPage`] is produced once per query and replaced whole by the next
//! one; nothing in this module merges or caches pages.

pub mod snippet;
mod types;

pub use types::*;
