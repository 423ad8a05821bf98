//! Main/index file header
//!
//! The 100-byte header shared by `.shp` and `.shx`. The first seven words are
//! big-endian, everything after the file length is little-endian.

use super::consts::*;
use crate::common::error::{Error, Result};
use crate::geometry::Envelope;
use zerocopy::{BE, F64, FromBytes, I32, LE};
use zerocopy_derive::FromBytes as DeriveFromBytes;

/// On-disk header layout (100 bytes)
#[derive(Debug, Clone, DeriveFromBytes)]
#[repr(C)]
struct RawFileHeader {
    /// Always 9994
    file_code: I32<BE>,
    /// Unused words
    unused: [I32<BE>; 5],
    /// Total file length in 16-bit words, header included
    file_length: I32<BE>,
    /// Always 1000
    version: I32<LE>,
    /// Shape type code
    shape_type: I32<LE>,
    /// x min, y min, x max, y max, z min, z max, m min, m max
    bbox: [F64<LE>; 8],
}

/// Parsed shapefile header.
///
/// The shape type is kept as the raw code; callers decide which codes they
/// support.
#[derive(Debug, Clone, PartialEq)]
pub struct FileHeader {
    pub file_code: i32,
    /// File length in 16-bit words
    pub file_length: i32,
    pub version: i32,
    pub shape_type: i32,
    pub envelope: Envelope,
    pub z_range: (f64, f64),
    pub m_range: (f64, f64),
}

impl FileHeader {
    /// Create a header for a file of `file_length` words.
    ///
    /// Z and M ranges are zero.
    pub fn new(shape_type: i32, file_length: i32, envelope: Envelope) -> Self {
        Self {
            file_code: FILE_CODE,
            file_length,
            version: VERSION,
            shape_type,
            envelope,
            z_range: (0.0, 0.0),
            m_range: (0.0, 0.0),
        }
    }

    /// Parse the first 100 bytes of a main or index file.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_BYTES {
            return Err(Error::InvalidData(format!(
                "Header needs {} bytes, got {}",
                HEADER_BYTES,
                data.len()
            )));
        }
        let raw = RawFileHeader::read_from_bytes(&data[..HEADER_BYTES])
            .map_err(|_| Error::InvalidData("Failed to parse file header".to_string()))?;

        let bbox: Vec<f64> = raw.bbox.iter().map(|v| v.get()).collect();
        Ok(Self {
            file_code: raw.file_code.get(),
            file_length: raw.file_length.get(),
            version: raw.version.get(),
            shape_type: raw.shape_type.get(),
            envelope: Envelope {
                min_x: bbox[0],
                min_y: bbox[1],
                max_x: bbox[2],
                max_y: bbox[3],
            },
            z_range: (bbox[4], bbox[5]),
            m_range: (bbox[6], bbox[7]),
        })
    }

    /// File length in bytes.
    #[inline]
    pub fn file_length_bytes(&self) -> u64 {
        self.file_length.max(0) as u64 * 2
    }

    /// Generate the 100-byte header block
    pub fn to_bytes(&self) -> [u8; HEADER_BYTES] {
        let mut header = [0u8; HEADER_BYTES];

        // File code (big-endian)
        header[0..4].copy_from_slice(&self.file_code.to_be_bytes());

        // Five unused words
        // header[4..24] already zeros

        // File length in words (big-endian)
        header[24..28].copy_from_slice(&self.file_length.to_be_bytes());

        // Version and shape type (little-endian)
        header[28..32].copy_from_slice(&self.version.to_le_bytes());
        header[32..36].copy_from_slice(&self.shape_type.to_le_bytes());

        let bbox = [
            self.envelope.min_x,
            self.envelope.min_y,
            self.envelope.max_x,
            self.envelope.max_y,
            self.z_range.0,
            self.z_range.1,
            self.m_range.0,
            self.m_range.1,
        ];
        for (i, value) in bbox.iter().enumerate() {
            let offset = 36 + i * 8;
            header[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
        }

        header
    }
}
