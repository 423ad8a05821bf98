//! Error type shared by every module of the crate.
//!
//! Lower-level failures (bounds-checked binary reads, geometry validation)
//! are converted into [`Error`] so that callers handle one type.

pub mod conversions;
pub mod types;

pub use types::{Error, Result};
