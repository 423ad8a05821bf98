//! Records, fields and values
//!
//! A [`Record`] is an ordered list of [`Field`]s, each holding a [`Value`].
//! Records read from a shapefile start with the synthetic `id*` field, carry
//! the attribute columns in table order and end with the synthetic `geom*`
//! field.

mod model;
mod source;
mod value;

pub use model::{Field, GEOMETRY_FIELD, ID_FIELD, Record, SYNTHETIC_SUFFIX};
pub use source::{AttributeSource, EmptyRows, MemoryRows};
pub use value::{Value, ValueType};
