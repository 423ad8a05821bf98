//! Editable table metadata.
//!
//! [`TableSchema`] lists the column descriptors of an attribute table and
//! supports the edits a caller makes before saving: adding blank columns,
//! removing columns, renaming new columns and changing types from textual
//! tokens.

use super::types::{DbfColumn, DbfFieldType};
use crate::common::error::{Error, Result};
use crate::record::Value;
use serde::{Deserialize, Serialize};

/// Name given to columns created by [`TableSchema::add_blank_column`]
pub const BLANK_COLUMN_NAME: &str = "New Column";

/// Width given to columns created by [`TableSchema::add_blank_column`]
pub const BLANK_COLUMN_LENGTH: u8 = 12;

/// Widest character column
pub const MAX_CHARACTER_LENGTH: u8 = 254;

// Widths used for inferred numeric columns
const INTEGER_LENGTH: u8 = 18;
const FLOAT_LENGTH: u8 = 24;
const FLOAT_DECIMALS: u8 = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SchemaColumn {
    column: DbfColumn,
    /// Read from an existing table; such columns keep their name
    original: bool,
}

/// Column descriptors of an attribute table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    columns: Vec<SchemaColumn>,
}

impl TableSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the descriptors of an existing table. The columns are marked
    /// original and cannot be renamed.
    pub fn from_columns(columns: Vec<DbfColumn>) -> Self {
        Self {
            columns: columns
                .into_iter()
                .map(|column| SchemaColumn { column, original: true })
                .collect(),
        }
    }

    /// Infer descriptors from attribute rows.
    ///
    /// Each column takes the type of its non-null values: integers and
    /// floats together widen to a float column, any other mix falls back to
    /// character. Float columns are widened to fit the largest integer part. Character widths fit the longest value; columns without
    /// values become character columns of `default_text_width`.
    pub fn infer<'a, R, V>(names: &[String], rows: R, default_text_width: u8) -> Self
    where
        R: IntoIterator<Item = V>,
        V: IntoIterator<Item = &'a Value>,
    {
        let mut kinds: Vec<Option<Inferred>> = vec![None; names.len()];
        let mut widths = vec![0usize; names.len()];

        for row in rows {
            for (i, value) in row.into_iter().enumerate().take(names.len()) {
                let Some(kind) = Inferred::of(value) else {
                    continue;
                };
                kinds[i] = Some(match kinds[i] {
                    None => kind,
                    Some(prev) => prev.merge(kind),
                });
                widths[i] = widths[i].max(display_width(value));
            }
        }

        let columns = names
            .iter()
            .zip(kinds)
            .zip(widths)
            .map(|((name, kind), width)| {
                let column = match kind {
                    None => DbfColumn::character(name.clone(), default_text_width.max(1)),
                    Some(Inferred::Text) => DbfColumn::character(name.clone(), clamp_width(width)),
                    Some(Inferred::Integer) => {
                        DbfColumn::numeric(name.clone(), INTEGER_LENGTH.max(clamp_width(width)), 0)
                    },
                    Some(Inferred::Float) => {
                        let length = clamp_width(width + 1 + FLOAT_DECIMALS as usize);
                        DbfColumn::numeric(name.clone(), FLOAT_LENGTH.max(length), FLOAT_DECIMALS)
                    },
                    Some(Inferred::Boolean) => DbfColumn::logical(name.clone()),
                    Some(Inferred::Date) => DbfColumn::date(name.clone()),
                    Some(Inferred::Binary) => {
                        DbfColumn::new(name.clone(), DbfFieldType::Binary, clamp_width(width), 0)
                    },
                };
                SchemaColumn { column, original: false }
            })
            .collect();

        Self { columns }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, index: usize) -> Option<&DbfColumn> {
        self.columns.get(index).map(|c| &c.column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &DbfColumn> + '_ {
        self.columns.iter().map(|c| &c.column)
    }

    pub fn names(&self) -> Vec<String> {
        self.columns().map(|c| c.name.clone()).collect()
    }

    pub fn is_original(&self, index: usize) -> bool {
        self.columns.get(index).is_some_and(|c| c.original)
    }

    /// Long type name of a column, as shown when editing metadata.
    pub fn type_name(&self, index: usize) -> Option<&'static str> {
        self.column(index).map(|c| c.field_type.name())
    }

    /// Append `("New Column", character, 12, 0)` and return its index.
    pub fn add_blank_column(&mut self) -> usize {
        self.add_column(DbfColumn::character(BLANK_COLUMN_NAME, BLANK_COLUMN_LENGTH))
    }

    /// Append a new column and return its index.
    pub fn add_column(&mut self, column: DbfColumn) -> usize {
        self.columns.push(SchemaColumn { column, original: false });
        self.columns.len() - 1
    }

    pub fn remove_column(&mut self, index: usize) -> Option<DbfColumn> {
        if index >= self.columns.len() {
            return None;
        }
        Some(self.columns.remove(index).column)
    }

    /// Rename a column added through this schema.
    ///
    /// Columns read from an existing table keep their names.
    pub fn rename_column(&mut self, index: usize, name: impl Into<String>) -> Result<()> {
        let entry = self.entry_mut(index)?;
        if entry.original {
            return Err(Error::InvalidAttribute(format!(
                "Column {:?} comes from the source table and cannot be renamed",
                entry.column.name
            )));
        }
        entry.column.name = name.into();
        Ok(())
    }

    pub fn set_type(&mut self, index: usize, field_type: DbfFieldType) -> Result<()> {
        self.entry_mut(index)?.column.field_type = field_type;
        Ok(())
    }

    /// Change a column type from a code or long name.
    ///
    /// Unrecognized tokens leave the column untouched; the return value tells
    /// whether the type was changed.
    pub fn set_type_token(&mut self, index: usize, token: &str) -> bool {
        match (DbfFieldType::parse_token(token), self.columns.get_mut(index)) {
            (Some(field_type), Some(entry)) => {
                entry.column.field_type = field_type;
                true
            },
            _ => false,
        }
    }

    pub fn set_length(&mut self, index: usize, length: u8) -> Result<()> {
        if length == 0 {
            return Err(Error::InvalidAttribute("Column length must be positive".to_string()));
        }
        self.entry_mut(index)?.column.length = length;
        Ok(())
    }

    pub fn set_decimals(&mut self, index: usize, decimals: u8) -> Result<()> {
        let entry = self.entry_mut(index)?;
        if decimals >= entry.column.length.max(1) {
            return Err(Error::InvalidAttribute(format!(
                "{} decimals do not fit a column of width {}",
                decimals, entry.column.length
            )));
        }
        entry.column.decimals = decimals;
        Ok(())
    }

    pub fn into_columns(self) -> Vec<DbfColumn> {
        self.columns.into_iter().map(|c| c.column).collect()
    }

    fn entry_mut(&mut self, index: usize) -> Result<&mut SchemaColumn> {
        let len = self.columns.len();
        self.columns.get_mut(index).ok_or_else(|| {
            Error::InvalidAttribute(format!("Column index {} out of range ({} columns)", index, len))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Inferred {
    Text,
    Integer,
    Float,
    Boolean,
    Date,
    Binary,
}

impl Inferred {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null | Value::Geometry(_) => None,
            Value::Text(_) => Some(Inferred::Text),
            Value::Integer(_) => Some(Inferred::Integer),
            Value::Float(_) => Some(Inferred::Float),
            Value::Boolean(_) => Some(Inferred::Boolean),
            Value::Date(_) => Some(Inferred::Date),
            Value::Binary(_) => Some(Inferred::Binary),
        }
    }

    fn merge(self, other: Self) -> Self {
        match (self, other) {
            (a, b) if a == b => a,
            (Inferred::Integer, Inferred::Float) | (Inferred::Float, Inferred::Integer) => {
                Inferred::Float
            },
            _ => Inferred::Text,
        }
    }
}

fn display_width(value: &Value) -> usize {
    match value {
        Value::Text(s) => s.len(),
        Value::Binary(b) => b.len(),
        Value::Integer(i) => itoa::Buffer::new().format(*i).len(),
        // Integer part only; decimals are added by the column
        Value::Float(f) if f.is_finite() => format!("{:.0}", f.trunc()).len(),
        other => other.to_string().len(),
    }
}

fn clamp_width(width: usize) -> u8 {
    width.clamp(1, MAX_CHARACTER_LENGTH as usize) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn original() -> TableSchema {
        TableSchema::from_columns(vec![
            DbfColumn::character("NAME", 20),
            DbfColumn::numeric("POP", 10, 0),
        ])
    }

    #[test]
    fn test_blank_column() {
        let mut schema = original();
        let index = schema.add_blank_column();
        assert_eq!(index, 2);
        assert_eq!(
            schema.column(index),
            Some(&DbfColumn::new("New Column", DbfFieldType::Character, 12, 0))
        );
        assert!(!schema.is_original(index));
    }

    #[test]
    fn test_original_columns_keep_names() {
        let mut schema = original();
        assert!(matches!(schema.rename_column(0, "TITLE"), Err(Error::InvalidAttribute(_))));

        let index = schema.add_blank_column();
        schema.rename_column(index, "CODE").unwrap();
        assert_eq!(schema.names(), vec!["NAME", "POP", "CODE"]);
    }

    #[test]
    fn test_unknown_type_token_is_ignored() {
        let mut schema = original();
        assert!(!schema.set_type_token(0, "varchar"));
        assert_eq!(schema.type_name(0), Some("character"));

        assert!(schema.set_type_token(0, "date"));
        assert_eq!(schema.column(0).unwrap().field_type, DbfFieldType::Date);
        assert!(schema.set_type_token(1, "L"));
        assert_eq!(schema.type_name(1), Some("boolean"));
        assert!(!schema.set_type_token(7, "C"));
    }

    #[test]
    fn test_remove_and_resize() {
        let mut schema = original();
        assert_eq!(schema.remove_column(0).map(|c| c.name), Some("NAME".to_string()));
        assert!(schema.remove_column(5).is_none());
        schema.set_length(0, 12).unwrap();
        schema.set_decimals(0, 2).unwrap();
        assert_eq!(schema.column(0), Some(&DbfColumn::numeric("POP", 12, 2)));
        assert!(schema.set_decimals(0, 12).is_err());
        assert!(schema.set_length(0, 0).is_err());
    }

    #[test]
    fn test_infer_types() {
        let names: Vec<String> = ["name", "count", "ratio", "flag", "empty"]
            .into_iter()
            .map(String::from)
            .collect();
        let rows = vec![
            vec![Value::from("Main Street"), Value::from(3), Value::from(1), Value::from(true), Value::Null],
            vec![Value::from("Elm"), Value::from(12), Value::from(0.5), Value::Null, Value::Null],
        ];
        let schema = TableSchema::infer(&names, rows.iter().map(|r| r.iter()), 16);

        let columns: Vec<&DbfColumn> = schema.columns().collect();
        assert_eq!(columns[0], &DbfColumn::character("name", 11));
        assert_eq!(columns[1].field_type, DbfFieldType::Numeric);
        assert_eq!(columns[1].decimals, 0);
        assert_eq!(columns[2], &DbfColumn::numeric("ratio", 24, 15));
        assert_eq!(columns[3], &DbfColumn::logical("flag"));
        assert_eq!(columns[4], &DbfColumn::character("empty", 16));
    }

    #[test]
    fn test_infer_mixed_values_fall_back_to_text() {
        let names = vec!["mixed".to_string()];
        let rows = vec![vec![Value::from(12345)], vec![Value::from("ab")]];
        let schema = TableSchema::infer(&names, rows.iter().map(|r| r.iter()), 8);
        assert_eq!(schema.column(0), Some(&DbfColumn::character("mixed", 5)));
    }

    #[test]
    fn test_infer_widens_large_floats() {
        let names = vec!["area".to_string()];
        let rows = vec![vec![Value::from(0.25)], vec![Value::from(-123456789012.5)]];
        let schema = TableSchema::infer(&names, rows.iter().map(|r| r.iter()), 8);
        assert_eq!(schema.column(0), Some(&DbfColumn::numeric("area", 29, 15)));
    }
}
