//! Status board rendering.

pub mod generator;

pub use generator::*;
