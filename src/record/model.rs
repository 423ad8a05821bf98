//! Ordered-field records.

use super::value::Value;
use crate::common::error::{Error, Result};
use crate::geometry::Geometry;
use serde::{Deserialize, Serialize};

/// Name of the synthetic 1-based identifier field of decoded records
pub const ID_FIELD: &str = "id*";

/// Name of the synthetic geometry field of decoded records
pub const GEOMETRY_FIELD: &str = "geom*";

/// Suffix that marks a synthetic field
pub const SYNTHETIC_SUFFIX: char = '*';

static NULL: Value = Value::Null;

/// A named value. Names are optional and need not be unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    name: Option<String>,
    value: Value,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: Some(name.into()),
            value: value.into(),
        }
    }

    pub fn unnamed(value: impl Into<Value>) -> Self {
        Self {
            name: None,
            value: value.into(),
        }
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// Whether the field was added by the record assembler rather than read
    /// from the attribute table: `id*` or `geom*`. Other names ending in the
    /// suffix are ordinary attributes.
    pub fn is_synthetic(&self) -> bool {
        self.matches(ID_FIELD) || self.matches(GEOMETRY_FIELD)
    }

    fn matches(&self, name: &str) -> bool {
        self.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(name))
    }
}

/// An ordered list of fields.
///
/// Records built by the caller are mutable. Records produced by the reader
/// are read-only: [`Record::set`] and [`Record::push`] fail with
/// [`Error::ReadOnlyRecord`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    fields: Vec<Field>,
    #[serde(skip)]
    read_only: bool,
}

impl Record {
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            fields,
            read_only: false,
        }
    }

    /// Build a record of unnamed fields.
    pub fn from_values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::new(values.into_iter().map(Field::unnamed).collect())
    }

    pub(crate) fn read_only(fields: Vec<Field>) -> Self {
        Self {
            fields,
            read_only: true,
        }
    }

    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    #[inline]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Value at `index`, `None` when out of range.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.fields.get(index).map(Field::value)
    }

    /// Value of the first field named `name`, ignoring ASCII case.
    ///
    /// Falls back to `name` followed by `*`, so `"geom"` finds the synthetic
    /// `geom*` field. Returns [`Value::Null`] when nothing matches.
    pub fn get_by_name(&self, name: &str) -> &Value {
        if let Some(field) = self.fields.iter().find(|f| f.matches(name)) {
            return field.value();
        }
        let synthetic = format!("{}{}", name, SYNTHETIC_SUFFIX);
        self.fields
            .iter()
            .find(|f| f.matches(&synthetic))
            .map_or(&NULL, Field::value)
    }

    /// Index and value of the first field holding a geometry.
    pub fn geometry(&self) -> Option<(usize, &Geometry)> {
        self.fields
            .iter()
            .enumerate()
            .find_map(|(i, f)| f.value().as_geometry().map(|g| (i, g)))
    }

    /// Replace the value at `index`.
    pub fn set(&mut self, index: usize, value: impl Into<Value>) -> Result<()> {
        if self.read_only {
            return Err(Error::ReadOnlyRecord);
        }
        let len = self.fields.len();
        let field = self.fields.get_mut(index).ok_or_else(|| {
            Error::InvalidAttribute(format!("Field index {} out of range ({} fields)", index, len))
        })?;
        field.value = value.into();
        Ok(())
    }

    /// Append a field.
    pub fn push(&mut self, field: Field) -> Result<()> {
        if self.read_only {
            return Err(Error::ReadOnlyRecord);
        }
        self.fields.push(field);
        Ok(())
    }

    pub fn into_fields(self) -> Vec<Field> {
        self.fields
    }
}

impl FromIterator<Field> for Record {
    fn from_iter<T: IntoIterator<Item = Field>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
