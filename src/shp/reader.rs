//! Shape decoder
//!
//! [`ShapeReader`] is a forward-only cursor over the records of a `.shp`
//! stream. It yields one `Option<Geometry>` per record, `None` standing for a
//! null shape, and releases the underlying reader as soon as the declared
//! record count is reached or an error occurs.

use super::consts::*;
use super::header::FileHeader;
use super::shape_type::ShapeType;
use crate::common::binary;
use crate::common::error::{Error, Result};
use crate::geometry::{
    Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon,
};
use smallvec::SmallVec;
use std::io::{BufReader, Read};

/// Part-start offsets of one record; most records have few parts
type PartOffsets = SmallVec<[usize; 8]>;

/// Lazy decoder over the records of a `.shp` stream.
///
/// The branch used to decode each record is chosen by the shape type in the
/// file header; the per-record code only distinguishes null shapes.
pub struct ShapeReader<R: Read> {
    /// Buffered source, `None` once exhausted or failed
    reader: Option<BufReader<R>>,
    header: FileHeader,
    shape_type: ShapeType,
    record_count: usize,
    position: usize,
    /// Reused record content buffer
    content: Vec<u8>,
}

impl<R: Read> ShapeReader<R> {
    /// Read the header and prepare to decode `record_count` records.
    ///
    /// Fails with [`Error::UnsupportedShapeType`] before any record is read
    /// when the header declares a type this crate cannot decode.
    pub fn new(reader: R, record_count: usize) -> Result<Self> {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY, reader, record_count)
    }

    /// Like [`ShapeReader::new`] with an explicit read buffer capacity.
    pub fn with_capacity(capacity: usize, reader: R, record_count: usize) -> Result<Self> {
        let mut reader = BufReader::with_capacity(capacity, reader);

        let mut header_bytes = [0u8; HEADER_BYTES];
        reader.read_exact(&mut header_bytes)?;
        let header = FileHeader::parse(&header_bytes)?;

        let shape_type = ShapeType::from_code(header.shape_type)
            .ok_or(Error::UnsupportedShapeType(header.shape_type))?;

        if header.file_code != FILE_CODE {
            log::warn!(
                "Unexpected file code {} (expected {}), continuing",
                header.file_code,
                FILE_CODE
            );
        }
        log::debug!(
            "Opened shape stream: type {}, {} records, {} bytes declared",
            shape_type,
            record_count,
            header.file_length_bytes()
        );

        Ok(Self {
            reader: if record_count > 0 { Some(reader) } else { None },
            header,
            shape_type,
            record_count,
            position: 0,
            content: Vec::new(),
        })
    }

    #[inline]
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    #[inline]
    pub fn shape_type(&self) -> ShapeType {
        self.shape_type
    }

    #[inline]
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Number of records decoded so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Release the underlying reader; later calls to `next` yield `None`.
    pub fn close(&mut self) {
        self.reader = None;
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.reader.is_none()
    }

    fn read_record(&mut self) -> Result<Option<Geometry>> {
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| Error::InvalidData("Shape stream is closed".to_string()))?;

        let mut record_header = [0u8; RECORD_HEADER_BYTES];
        reader.read_exact(&mut record_header)?;
        let record_number = binary::read_i32_be(&record_header, 0)?;
        let content_words = binary::read_i32_be(&record_header, 4)?;

        if content_words < SHAPE_TYPE_WORDS as i32 {
            return Err(Error::InvalidData(format!(
                "Record {} has content length {} words",
                record_number, content_words
            )));
        }
        let origin_index = record_number
            .checked_sub(1)
            .and_then(|i| usize::try_from(i).ok())
            .ok_or_else(|| Error::InvalidData(format!("Invalid record number {}", record_number)))?;

        // Reading the whole content keeps the stream aligned even for null
        // shapes and records with trailing bytes. The buffer only grows with
        // the bytes actually present.
        let content_bytes = content_words as u64 * 2;
        self.content.clear();
        reader.by_ref().take(content_bytes).read_to_end(&mut self.content)?;
        if (self.content.len() as u64) < content_bytes {
            return Err(Error::InvalidData(format!(
                "Record {} declares {} content bytes but only {} remain",
                record_number,
                content_bytes,
                self.content.len()
            )));
        }

        decode_content(self.shape_type, origin_index, &self.content)
    }
}

impl<R: Read> Iterator for ShapeReader<R> {
    type Item = Result<Option<Geometry>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.reader.is_none() || self.position >= self.record_count {
            return None;
        }

        match self.read_record() {
            Ok(geometry) => {
                self.position += 1;
                if self.position >= self.record_count {
                    self.close();
                }
                Some(Ok(geometry))
            },
            Err(e) => {
                self.close();
                Some(Err(e))
            },
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.reader.is_none() {
            return (0, Some(0));
        }
        let remaining = self.record_count - self.position;
        (0, Some(remaining))
    }
}

/// Decode one record's content (shape type code included).
pub(crate) fn decode_content(
    shape_type: ShapeType,
    origin_index: usize,
    content: &[u8],
) -> Result<Option<Geometry>> {
    let code = binary::read_i32_le(content, 0)?;
    if code == ShapeType::Null.code() {
        return Ok(None);
    }
    if code != shape_type.code() {
        log::warn!(
            "Record {} declares shape type {} in a {} file",
            origin_index + 1,
            code,
            shape_type
        );
    }

    let geometry = match shape_type {
        ShapeType::Null => {
            return Err(Error::InvalidData(format!(
                "Record {} holds shape type {} in a null shape file",
                origin_index + 1,
                code
            )));
        },
        ShapeType::Point => {
            let x = binary::read_f64_le(content, CONTENT_BOX_OFFSET)?;
            let y = binary::read_f64_le(content, CONTENT_BOX_OFFSET + 8)?;
            Geometry::from(Point::new(x, y))
        },
        ShapeType::MultiPoint => decode_multipoint(content)?,
        ShapeType::Polyline | ShapeType::Polygon => decode_poly(shape_type, content)?,
    };

    Ok(Some(geometry.with_origin_index(origin_index)))
}

fn decode_multipoint(content: &[u8]) -> Result<Geometry> {
    // Bounding box (4 doubles) is derived data and skipped
    let num_points = binary::read_count_le(content, CONTENT_POINT_COUNT_OFFSET)?;
    ensure_coords_fit(content, CONTENT_MULTIPOINT_COORDS_OFFSET, num_points)?;

    let coords = read_coords(content, CONTENT_MULTIPOINT_COORDS_OFFSET, num_points)?;
    Ok(MultiPoint(coords.into_iter().map(Point).collect()).into())
}

fn decode_poly(shape_type: ShapeType, content: &[u8]) -> Result<Geometry> {
    let num_parts = binary::read_count_le(content, CONTENT_PART_COUNT_OFFSET)?;
    let num_points = binary::read_count_le(content, CONTENT_POLY_POINT_COUNT_OFFSET)?;

    let coords_offset = num_parts
        .checked_mul(4)
        .and_then(|n| n.checked_add(CONTENT_PART_OFFSETS_OFFSET))
        .ok_or_else(|| Error::InvalidData(format!("Part count {} is too large", num_parts)))?;
    ensure_coords_fit(content, coords_offset, num_points)?;

    let mut offsets = PartOffsets::with_capacity(num_parts);
    for k in 0..num_parts {
        offsets.push(binary::read_count_le(content, CONTENT_PART_OFFSETS_OFFSET + k * 4)?);
    }

    let coords = read_coords(content, coords_offset, num_points)?;

    let mut lines = Vec::new();
    let mut rings = Vec::new();
    for k in 0..num_parts {
        let start = offsets[k];
        let end = if k + 1 < num_parts { offsets[k + 1] } else { num_points };
        if start > end || end > num_points {
            return Err(Error::InvalidData(format!(
                "Part {} spans vertices {}..{} of {}",
                k, start, end, num_points
            )));
        }

        let part = coords[start..end].to_vec();
        match shape_type {
            ShapeType::Polygon => rings.push(Polygon::new(part)?),
            _ => lines.push(LineString::new(part)),
        }
    }

    let geometry = match shape_type {
        ShapeType::Polygon if rings.len() == 1 => rings.remove(0).into(),
        ShapeType::Polygon => MultiPolygon(rings).into(),
        _ if lines.len() == 1 => lines.remove(0).into(),
        _ => MultiLineString(lines).into(),
    };
    Ok(geometry)
}

/// Reject point counts the record content cannot hold before allocating.
fn ensure_coords_fit(content: &[u8], offset: usize, num_points: usize) -> Result<()> {
    let needed = num_points
        .checked_mul(16)
        .and_then(|n| n.checked_add(offset))
        .ok_or_else(|| Error::InvalidData(format!("Point count {} is too large", num_points)))?;
    if needed > content.len() {
        return Err(Error::InvalidData(format!(
            "Record content holds {} bytes, {} points need {}",
            content.len(),
            num_points,
            needed
        )));
    }
    Ok(())
}

fn read_coords(content: &[u8], offset: usize, count: usize) -> Result<Vec<Coord>> {
    let mut coords = Vec::with_capacity(count);
    for i in 0..count {
        let base = offset + i * 16;
        let x = binary::read_f64_le(content, base)?;
        let y = binary::read_f64_le(content, base + 8)?;
        coords.push(Coord::new(x, y));
    }
    Ok(coords)
}
