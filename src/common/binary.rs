//! Binary data parsing utilities shared across file formats.
//!
//! Shapefiles mix byte orders: file and record headers carry big-endian
//! integers while shape payloads are little-endian. The dBASE attribute table
//! is little-endian throughout. Every reader here is bounds-checked and takes
//! an explicit byte offset into the slice.

use zerocopy::{BE, F64, FromBytes, I32, LE};

/// Binary parsing error type
#[derive(Debug, Clone)]
pub enum BinaryError {
    /// Not enough data to read the requested type
    InsufficientData { expected: usize, available: usize },
    /// Failed to parse the data
    ParseError(String),
}

impl std::fmt::Display for BinaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryError::InsufficientData {
                expected,
                available,
            } => {
                write!(
                    f,
                    "Insufficient data: expected {}, got {}",
                    expected, available
                )
            },
            BinaryError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for BinaryError {}

/// Result type for binary operations
pub type BinaryResult<T> = Result<T, BinaryError>;

#[inline]
fn check_bounds(data: &[u8], offset: usize, width: usize) -> BinaryResult<()> {
    match offset.checked_add(width) {
        Some(end) if end <= data.len() => Ok(()),
        _ => Err(BinaryError::InsufficientData {
            expected: offset.saturating_add(width),
            available: data.len(),
        }),
    }
}

/// Read a little-endian i32 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use shpio::common::binary::read_i32_le;
/// let data = [0xFF, 0xFF, 0xFF, 0xFF];
/// assert_eq!(read_i32_le(&data, 0).unwrap(), -1i32);
/// ```
#[inline]
pub fn read_i32_le(data: &[u8], offset: usize) -> BinaryResult<i32> {
    check_bounds(data, offset, 4)?;
    I32::<LE>::read_from_bytes(&data[offset..offset + 4])
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("Failed to read i32".to_string()))
}

/// Read a big-endian i32 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use shpio::common::binary::read_i32_be;
/// let data = [0x00, 0x00, 0x27, 0x0A];
/// assert_eq!(read_i32_be(&data, 0).unwrap(), 9994);
/// ```
#[inline]
pub fn read_i32_be(data: &[u8], offset: usize) -> BinaryResult<i32> {
    check_bounds(data, offset, 4)?;
    I32::<BE>::read_from_bytes(&data[offset..offset + 4])
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("Failed to read i32".to_string()))
}

/// Read a little-endian f64 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use shpio::common::binary::read_f64_le;
/// let data = [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xF0, 0x3F];
/// assert!((read_f64_le(&data, 0).unwrap() - 1.0).abs() < f64::EPSILON);
/// ```
#[inline]
pub fn read_f64_le(data: &[u8], offset: usize) -> BinaryResult<f64> {
    check_bounds(data, offset, 8)?;
    F64::<LE>::read_from_bytes(&data[offset..offset + 8])
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("Failed to read f64".to_string()))
}

/// Read a little-endian count field and reject negative values.
///
/// Shape records store part and point counts as signed 32-bit integers.
#[inline]
pub fn read_count_le(data: &[u8], offset: usize) -> BinaryResult<usize> {
    let value = read_i32_le(data, offset)?;
    usize::try_from(value)
        .map_err(|_| BinaryError::ParseError(format!("Negative count {} at offset {}", value, offset)))
}
