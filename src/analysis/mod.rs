//! Analysis modules.
//!
//! Sorting, section filtering and lane statistics for the status board.

pub mod aggregator;

pub use aggregator::*;
