//! Constants for the shapefile main and index file formats.
//!
//! Lengths inside the files are counted in 16-bit words; the `*_BYTES`
//! constants are the same quantities in bytes.

/// File code stored big-endian in the first four bytes of `.shp` and `.shx`
pub const FILE_CODE: i32 = 9994;

/// Format version stored little-endian at byte 28
pub const VERSION: i32 = 1000;

/// Size of the main and index file headers
pub const HEADER_BYTES: usize = 100;
pub const HEADER_WORDS: i32 = 50;

/// Size of the per-record header (record number + content length)
pub const RECORD_HEADER_BYTES: usize = 8;
pub const RECORD_HEADER_WORDS: i32 = 4;

/// Size of one `.shx` entry (offset + content length)
pub const SHX_ENTRY_BYTES: usize = 8;
pub const SHX_ENTRY_WORDS: i32 = 4;

// Record content building blocks, in words
pub(crate) const SHAPE_TYPE_WORDS: i64 = 2;
pub(crate) const BOX_WORDS: i64 = 16;
pub(crate) const COUNT_WORDS: i64 = 2;
pub(crate) const PART_OFFSET_WORDS: i64 = 2;
pub(crate) const COORD_WORDS: i64 = 8;

// Byte offsets inside record content (content starts with the shape type)
pub(crate) const CONTENT_BOX_OFFSET: usize = 4;
pub(crate) const CONTENT_POINT_COUNT_OFFSET: usize = 36;
pub(crate) const CONTENT_MULTIPOINT_COORDS_OFFSET: usize = 40;
pub(crate) const CONTENT_PART_COUNT_OFFSET: usize = 36;
pub(crate) const CONTENT_POLY_POINT_COUNT_OFFSET: usize = 40;
pub(crate) const CONTENT_PART_OFFSETS_OFFSET: usize = 44;

/// Default capacity of the buffered reader wrapping a `.shp` source
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;
