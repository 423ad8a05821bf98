//! Record index (`.shx`) building, reading and writing.
//!
//! The index table is computed once per save and borrowed by both the `.shx`
//! writer and the shape encoder, so the two files always agree on where each
//! record lives.

use super::consts::*;
use super::header::FileHeader;
use super::shape_type::ShapeType;
use crate::common::binary;
use crate::common::error::{Error, Result};
use crate::geometry::{Envelope, Geometry};
use std::io::{Read, Write};

/// Location of one record inside the main file.
///
/// Both fields are in 16-bit words, the unit the format stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// Offset of the record header from the start of the file
    pub offset: i32,
    /// Length of the record content, record header excluded
    pub content_length: i32,
}

impl IndexEntry {
    #[inline]
    pub fn offset_bytes(&self) -> u64 {
        self.offset.max(0) as u64 * 2
    }

    #[inline]
    pub fn content_length_bytes(&self) -> usize {
        self.content_length.max(0) as usize * 2
    }

    /// Offset of the word following this record.
    #[inline]
    pub fn end(&self) -> i64 {
        self.offset as i64 + self.content_length as i64 + RECORD_HEADER_WORDS as i64
    }
}

/// Content length in words of a record holding `geometry` in a file of type
/// `shape_type`.
///
/// The geometry must already be known to fit the shape type.
pub fn content_length_words(shape_type: ShapeType, geometry: Option<&Geometry>) -> i64 {
    let Some(geometry) = geometry else {
        return SHAPE_TYPE_WORDS;
    };
    let points = geometry.num_coords() as i64;
    match shape_type {
        ShapeType::Null => SHAPE_TYPE_WORDS,
        ShapeType::Point => SHAPE_TYPE_WORDS + COORD_WORDS,
        ShapeType::MultiPoint => SHAPE_TYPE_WORDS + BOX_WORDS + COUNT_WORDS + points * COORD_WORDS,
        ShapeType::Polyline | ShapeType::Polygon => {
            let parts = geometry.num_parts() as i64;
            SHAPE_TYPE_WORDS
                + BOX_WORDS
                + COUNT_WORDS * 2
                + parts * PART_OFFSET_WORDS
                + points * COORD_WORDS
        },
    }
}

/// Offset/length table for every record, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordIndex {
    entries: Vec<IndexEntry>,
}

impl RecordIndex {
    /// Compute the table for `geometries` written to a file of `shape_type`.
    ///
    /// `None` entries become null records. Fails with
    /// [`Error::ShapeTypeMismatch`] when a geometry does not fit the file.
    ///
    /// # Examples
    ///
    /// ```
    /// use shpio::geometry::Geometry;
    /// use shpio::shp::{RecordIndex, ShapeType};
    ///
    /// let a = Geometry::point(1.0, 2.0);
    /// let b = Geometry::point(3.0, 4.0);
    /// let index = RecordIndex::build(ShapeType::Point, [Some(&a), None, Some(&b)]).unwrap();
    ///
    /// let offsets: Vec<i32> = index.entries().iter().map(|e| e.offset).collect();
    /// assert_eq!(offsets, vec![50, 64, 70]);
    /// assert_eq!(index.file_length_words(), 84);
    /// ```
    pub fn build<'a, I>(shape_type: ShapeType, geometries: I) -> Result<Self>
    where
        I: IntoIterator<Item = Option<&'a Geometry>>,
    {
        let mut entries = Vec::new();
        let mut pos = HEADER_WORDS as i64;

        for (i, geometry) in geometries.into_iter().enumerate() {
            if let Some(g) = geometry
                && !shape_type.accepts(g)
            {
                return Err(Error::ShapeTypeMismatch {
                    record: i,
                    expected: shape_type.name(),
                    found: g.type_name(),
                });
            }

            let content_length = content_length_words(shape_type, geometry);
            entries.push(IndexEntry {
                offset: to_words(pos)?,
                content_length: to_words(content_length)?,
            });
            pos += content_length + RECORD_HEADER_WORDS as i64;
        }

        // The main file length must also fit a signed word count
        to_words(pos)?;
        Ok(Self { entries })
    }

    /// Wrap an existing entry table.
    pub fn from_entries(entries: Vec<IndexEntry>) -> Self {
        Self { entries }
    }

    #[inline]
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&IndexEntry> {
        self.entries.get(index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Length in words of the main file described by this table.
    pub fn file_length_words(&self) -> i32 {
        match self.entries.last() {
            Some(last) => last.end() as i32,
            None => HEADER_WORDS,
        }
    }

    /// Length in words of the `.shx` file holding this table.
    pub fn index_file_length_words(&self) -> i32 {
        HEADER_WORDS + self.entries.len() as i32 * SHX_ENTRY_WORDS
    }

    /// Check that records are contiguous and start right after the header.
    pub fn validate(&self) -> Result<()> {
        let mut expected = HEADER_WORDS as i64;
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.content_length < 0 {
                return Err(Error::InvalidData(format!(
                    "Index entry {} has negative content length {}",
                    i, entry.content_length
                )));
            }
            if entry.offset as i64 != expected {
                return Err(Error::InvalidData(format!(
                    "Index entry {} starts at word {}, expected {}",
                    i, entry.offset, expected
                )));
            }
            expected = entry.end();
        }
        Ok(())
    }

    /// Parse a complete `.shx` stream.
    pub fn read<R: Read>(mut reader: R) -> Result<(FileHeader, Self)> {
        let mut header_bytes = [0u8; HEADER_BYTES];
        reader.read_exact(&mut header_bytes)?;
        let header = FileHeader::parse(&header_bytes)?;

        let mut body = Vec::new();
        reader.read_to_end(&mut body)?;

        // The header length is authoritative when present, trailing bytes are ignored
        let declared = header.file_length_bytes().saturating_sub(HEADER_BYTES as u64) as usize;
        let available = if declared > 0 { declared.min(body.len()) } else { body.len() };
        if declared > body.len() {
            log::warn!(
                "Index declares {} body bytes but only {} are present",
                declared,
                body.len()
            );
        }
        if available % SHX_ENTRY_BYTES != 0 {
            log::warn!(
                "Index body length {} is not a multiple of {}, ignoring the partial entry",
                available,
                SHX_ENTRY_BYTES
            );
        }

        let count = available / SHX_ENTRY_BYTES;
        let mut entries = Vec::with_capacity(count);
        for i in 0..count {
            let base = i * SHX_ENTRY_BYTES;
            entries.push(IndexEntry {
                offset: binary::read_i32_be(&body, base)?,
                content_length: binary::read_i32_be(&body, base + 4)?,
            });
        }

        log::debug!("Read index with {} entries", entries.len());
        Ok((header, Self { entries }))
    }

    /// Write the table as a `.shx` stream.
    pub fn write<W: Write>(
        &self,
        mut writer: W,
        shape_type: ShapeType,
        envelope: Envelope,
    ) -> Result<()> {
        let header = FileHeader::new(shape_type.code(), self.index_file_length_words(), envelope);
        writer.write_all(&header.to_bytes())?;

        for entry in &self.entries {
            writer.write_all(&entry.offset.to_be_bytes())?;
            writer.write_all(&entry.content_length.to_be_bytes())?;
        }

        writer.flush()?;
        Ok(())
    }
}

fn to_words(value: i64) -> Result<i32> {
    i32::try_from(value).map_err(|_| {
        Error::InvalidData(format!("Word count {} exceeds the format limit", value))
    })
}
