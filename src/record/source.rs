//! Attribute source contract.
//!
//! The record assembler only needs ordered column names and a single-pass
//! sequence of rows. The dBASE reader implements this trait; any other table
//! can be paired with a geometry file the same way.

use super::value::Value;
use crate::common::error::Result;
use std::collections::VecDeque;

/// Ordered column names plus a lazy, forward-only sequence of rows.
pub trait AttributeSource {
    /// Column names in row order.
    fn columns(&self) -> &[String];

    /// Get the next row, `None` once exhausted.
    fn next_row(&mut self) -> Option<Result<Vec<Value>>>;
}

impl<S: AttributeSource + ?Sized> AttributeSource for Box<S> {
    fn columns(&self) -> &[String] {
        (**self).columns()
    }

    fn next_row(&mut self) -> Option<Result<Vec<Value>>> {
        (**self).next_row()
    }
}

/// In-memory attribute rows.
#[derive(Debug, Clone, Default)]
pub struct MemoryRows {
    columns: Vec<String>,
    rows: VecDeque<Vec<Value>>,
}

impl MemoryRows {
    pub fn new<C, S>(columns: C, rows: Vec<Vec<Value>>) -> Self
    where
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: rows.into(),
        }
    }

    /// Rows not yet consumed.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl AttributeSource for MemoryRows {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> Option<Result<Vec<Value>>> {
        self.rows.pop_front().map(Ok)
    }
}

/// Rows without columns, one empty row per geometry. Used when a shapefile
/// has no attribute table.
#[derive(Debug, Clone, Default)]
pub struct EmptyRows {
    remaining: usize,
}

impl EmptyRows {
    pub fn new(count: usize) -> Self {
        Self { remaining: count }
    }
}

impl AttributeSource for EmptyRows {
    fn columns(&self) -> &[String] {
        &[]
    }

    fn next_row(&mut self) -> Option<Result<Vec<Value>>> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(Ok(Vec::new()))
    }
}
