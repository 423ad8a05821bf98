//! Lockstep record assembly.

use crate::common::error::{Error, Result};
use crate::record::{AttributeSource, Field, GEOMETRY_FIELD, ID_FIELD, Record, Value};
use crate::shp::ShapeReader;
use std::io::Read;

/// Lazy sequence of records pairing one attribute row with one geometry.
///
/// Each record is `[id*, attributes..., geom*]` where `id*` is the 1-based
/// position. The pairing is positional and checked: a geometry whose origin
/// index differs from its position, or a row count that differs from the
/// geometry count, ends the sequence with [`Error::Desynchronized`]. Both
/// streams are released when the sequence ends, whether by exhaustion or by
/// error.
pub struct RecordIter<R: Read, A: AttributeSource> {
    streams: Option<(ShapeReader<R>, A)>,
    columns: Vec<String>,
    next_id: usize,
}

impl<R: Read, A: AttributeSource> RecordIter<R, A> {
    pub fn new(geometries: ShapeReader<R>, attributes: A) -> Self {
        let columns = attributes.columns().to_vec();
        Self {
            streams: Some((geometries, attributes)),
            columns,
            next_id: 1,
        }
    }

    /// Attribute column names, synthetic fields excluded.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of records produced so far.
    pub fn position(&self) -> usize {
        self.next_id - 1
    }

    pub fn is_closed(&self) -> bool {
        self.streams.is_none()
    }

    fn pull(&mut self) -> Option<Result<Record>> {
        let (geometries, attributes) = self.streams.as_mut()?;
        let id = self.next_id;

        let geometry = match geometries.next() {
            Some(Ok(geometry)) => geometry,
            Some(Err(e)) => return Some(Err(e)),
            None => {
                // Geometries are exhausted; the table must be too
                return match attributes.next_row() {
                    None => None,
                    Some(Err(e)) => Some(Err(e)),
                    Some(Ok(_)) => Some(Err(Error::Desynchronized {
                        record: id,
                        detail: "attribute table has more rows than the geometry file".to_string(),
                    })),
                };
            },
        };

        let values = match attributes.next_row() {
            Some(Ok(values)) => values,
            Some(Err(e)) => return Some(Err(e)),
            None => {
                return Some(Err(Error::Desynchronized {
                    record: id,
                    detail: "attribute table ended before the geometry file".to_string(),
                }));
            },
        };

        if let Some(g) = &geometry
            && g.origin_index() != Some(id - 1)
        {
            return Some(Err(Error::Desynchronized {
                record: id,
                detail: format!(
                    "geometry was decoded from record {:?}",
                    g.origin_index().map(|i| i + 1)
                ),
            }));
        }

        if values.len() != self.columns.len() {
            return Some(Err(Error::InvalidData(format!(
                "Row {} holds {} values for {} columns",
                id,
                values.len(),
                self.columns.len()
            ))));
        }

        let mut fields = Vec::with_capacity(values.len() + 2);
        fields.push(Field::new(ID_FIELD, Value::Integer(id as i64)));
        fields.extend(
            self.columns
                .iter()
                .zip(values)
                .map(|(name, value)| Field::new(name.as_str(), value)),
        );
        fields.push(Field::new(GEOMETRY_FIELD, Value::from(geometry)));

        self.next_id += 1;
        Some(Ok(Record::read_only(fields)))
    }
}

impl<R: Read, A: AttributeSource> Iterator for RecordIter<R, A> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.pull();
        match &item {
            Some(Ok(_)) => {},
            // Exhausted or failed
            _ => self.streams = None,
        }
        item
    }
}
