//! Options for the shapefile facade.

use crate::shp::consts::DEFAULT_BUFFER_CAPACITY;
use encoding_rs::Encoding;

/// Configuration for opening and saving shapefiles.
///
/// # Examples
///
/// ```rust
/// use shpio::shapefile::ShapefileOptions;
///
/// // Create with defaults
/// let options = ShapefileOptions::default();
///
/// // Or customize
/// let options = ShapefileOptions::new()
///     .with_create_dirs(false)
///     .with_default_text_width(32)
///     .with_encoding(encoding_rs::WINDOWS_1252);
/// ```
#[derive(Debug, Clone)]
pub struct ShapefileOptions {
    /// Capacity of the buffered reader wrapping `.shp` and `.dbf` files
    pub buffer_capacity: usize,
    /// Whether `save_as` creates the target directory when missing
    pub create_dirs: bool,
    /// Whether `save_as` writes a `.prj` file when a projection is set
    pub write_projection: bool,
    /// Whether `save_as` writes a `.cpg` file naming the text encoding
    pub write_code_page: bool,
    /// Width of inferred character columns that hold no values
    pub default_text_width: u8,
    /// Text encoding for attribute tables; when unset, reading follows the
    /// `.cpg` file or the table header and writing uses UTF-8
    pub encoding: Option<&'static Encoding>,
}

impl Default for ShapefileOptions {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            create_dirs: true,
            write_projection: true,
            write_code_page: true,
            default_text_width: 12,
            encoding: None,
        }
    }
}

impl ShapefileOptions {
    /// Create a new `ShapefileOptions` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the read buffer capacity in bytes.
    #[inline]
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity.max(1);
        self
    }

    /// Set whether missing output directories are created.
    #[inline]
    pub fn with_create_dirs(mut self, create: bool) -> Self {
        self.create_dirs = create;
        self
    }

    /// Set whether the projection is written next to the saved files.
    #[inline]
    pub fn with_write_projection(mut self, write: bool) -> Self {
        self.write_projection = write;
        self
    }

    /// Set whether a `.cpg` file is written next to the saved files.
    #[inline]
    pub fn with_write_code_page(mut self, write: bool) -> Self {
        self.write_code_page = write;
        self
    }

    /// Set the width of character columns inferred from empty data.
    #[inline]
    pub fn with_default_text_width(mut self, width: u8) -> Self {
        self.default_text_width = width.max(1);
        self
    }

    /// Force the text encoding of attribute tables.
    ///
    /// Reading ignores the `.cpg` file and the code page in the table
    /// header; writing encodes text with this encoding.
    #[inline]
    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }
}
