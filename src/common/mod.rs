//! Types and utilities shared by the geometry codec and the attribute table.

pub mod binary;
pub mod encoding;
pub mod error;

pub use error::{Error, Result};
