//! Shape encoder
//!
//! Serializes geometries into a `.shp` stream using a [`RecordIndex`] computed
//! beforehand. Each record is encoded into a scratch buffer and its length is
//! checked against the index entry before it is written, so the main file can
//! never drift from the `.shx` written from the same table.

use super::consts::*;
use super::header::FileHeader;
use super::index::RecordIndex;
use super::shape_type::ShapeType;
use crate::common::error::{Error, Result};
use crate::geometry::{Coord, Envelope, Geometry};
use std::io::Write;

/// Writer for the main `.shp` file.
pub struct ShapeWriter<W: Write> {
    writer: W,
    /// Scratch buffer for one record's content
    buf: Vec<u8>,
}

impl<W: Write> ShapeWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            buf: Vec::new(),
        }
    }

    /// Write the header and every record.
    ///
    /// `geometries` must hold exactly one entry per index entry, `None`
    /// producing a null record. `envelope` is stored as the aggregate
    /// bounding box.
    pub fn write(
        &mut self,
        shape_type: ShapeType,
        index: &RecordIndex,
        geometries: &[Option<&Geometry>],
        envelope: Envelope,
    ) -> Result<()> {
        if geometries.len() != index.len() {
            return Err(Error::InvalidData(format!(
                "Index holds {} entries for {} geometries",
                index.len(),
                geometries.len()
            )));
        }

        let header = FileHeader::new(shape_type.code(), index.file_length_words(), envelope);
        self.writer.write_all(&header.to_bytes())?;

        for (i, (entry, geometry)) in index.entries().iter().zip(geometries).enumerate() {
            self.buf.clear();
            encode_content(&mut self.buf, shape_type, *geometry)?;

            if self.buf.len() != entry.content_length_bytes() {
                return Err(Error::InvalidData(format!(
                    "Record {} encodes to {} bytes but the index reserves {}",
                    i + 1,
                    self.buf.len(),
                    entry.content_length_bytes()
                )));
            }

            // Record numbers start with 1
            self.writer.write_all(&(i as i32 + 1).to_be_bytes())?;
            self.writer.write_all(&entry.content_length.to_be_bytes())?;
            self.writer.write_all(&self.buf)?;
        }

        self.writer.flush()?;
        Ok(())
    }

    /// Consume the writer and return the underlying sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Append the content of one record, shape type code included.
pub(crate) fn encode_content(
    buf: &mut Vec<u8>,
    shape_type: ShapeType,
    geometry: Option<&Geometry>,
) -> Result<()> {
    let Some(geometry) = geometry else {
        buf.extend_from_slice(&ShapeType::Null.code().to_le_bytes());
        return Ok(());
    };

    buf.extend_from_slice(&shape_type.code().to_le_bytes());

    match shape_type {
        ShapeType::Null => {
            return Err(Error::ShapeTypeMismatch {
                record: geometry.origin_index().unwrap_or(0),
                expected: shape_type.name(),
                found: geometry.type_name(),
            });
        },
        ShapeType::Point => {
            let coord = geometry
                .coords()
                .next()
                .ok_or_else(|| Error::InvalidGeometry("Point has no coordinate".to_string()))?;
            write_coord(buf, coord);
        },
        ShapeType::MultiPoint => {
            write_box(buf, geometry.envelope());
            buf.extend_from_slice(&count_to_i32(geometry.num_coords())?.to_le_bytes());
            for coord in geometry.coords() {
                write_coord(buf, coord);
            }
        },
        ShapeType::Polyline | ShapeType::Polygon => {
            let parts = geometry.parts();
            let num_points: usize = parts.iter().map(|p| p.len()).sum();

            write_box(buf, geometry.envelope());
            buf.extend_from_slice(&count_to_i32(parts.len())?.to_le_bytes());
            buf.extend_from_slice(&count_to_i32(num_points)?.to_le_bytes());

            // Part-start offsets in vertex units
            let mut pos = 0usize;
            for part in &parts {
                buf.extend_from_slice(&count_to_i32(pos)?.to_le_bytes());
                pos += part.len();
            }

            for part in &parts {
                for &coord in part.iter() {
                    write_coord(buf, coord);
                }
            }
        },
    }

    Ok(())
}

#[inline]
fn write_coord(buf: &mut Vec<u8>, coord: Coord) {
    buf.extend_from_slice(&coord.x.to_le_bytes());
    buf.extend_from_slice(&coord.y.to_le_bytes());
}

/// Bounding box of the record; an empty geometry gets an all-zero box.
fn write_box(buf: &mut Vec<u8>, envelope: Option<Envelope>) {
    let values = match envelope {
        Some(env) => [env.min_x, env.min_y, env.max_x, env.max_y],
        None => [0.0; 4],
    };
    for value in values {
        buf.extend_from_slice(&value.to_le_bytes());
    }
}

fn count_to_i32(count: usize) -> Result<i32> {
    i32::try_from(count)
        .map_err(|_| Error::InvalidData(format!("Count {} exceeds the format limit", count)))
}
