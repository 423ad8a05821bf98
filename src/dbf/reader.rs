//! dBASE table reader.

use super::consts::*;
use super::types::{DbfColumn, DbfFieldType};
use crate::common::encoding;
use crate::common::error::{Error, Result};
use crate::record::{AttributeSource, Value};
use crate::shp::consts::DEFAULT_BUFFER_CAPACITY;
use bytes::Bytes;
use chrono::NaiveDate;
use encoding_rs::Encoding;
use std::io::{BufReader, Read};
use zerocopy::{FromBytes, LE, U16, U32};
use zerocopy_derive::FromBytes as DeriveFromBytes;

/// Table header as stored on disk.
#[derive(Debug, Clone, DeriveFromBytes)]
#[repr(C)]
struct RawTableHeader {
    version: u8,
    /// Last update as years since 1900, month, day
    updated: [u8; 3],
    record_count: U32<LE>,
    header_length: U16<LE>,
    record_length: U16<LE>,
    _reserved: [u8; 17],
    language_driver: u8,
    _reserved2: [u8; 2],
}

/// Column descriptor as stored on disk.
#[derive(Debug, Clone, DeriveFromBytes)]
#[repr(C)]
struct RawColumnDescriptor {
    name: [u8; 11],
    field_type: u8,
    _displacement: [u8; 4],
    length: u8,
    decimals: u8,
    _reserved: [u8; 14],
}

/// Parsed table header.
#[derive(Debug, Clone, PartialEq)]
pub struct TableHeader {
    pub version: u8,
    pub last_update: Option<NaiveDate>,
    pub record_count: u32,
    pub header_length: u16,
    pub record_length: u16,
    pub language_driver: u8,
}

/// Lazy reader over the rows of a `.dbf` stream.
///
/// Rows are yielded in file order, deleted rows included, so that row `i`
/// always lines up with record `i` of the geometry file.
pub struct DbfReader<R: Read> {
    reader: Option<BufReader<R>>,
    header: TableHeader,
    columns: Vec<DbfColumn>,
    names: Vec<String>,
    /// Byte offset of each column inside a row
    offsets: Vec<usize>,
    encoding: &'static Encoding,
    position: usize,
    row: Vec<u8>,
}

impl<R: Read> DbfReader<R> {
    /// Parse the header and column descriptors.
    ///
    /// Text is decoded with the code page named by the language driver id,
    /// UTF-8 when none is set.
    pub fn new(reader: R) -> Result<Self> {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY, reader)
    }

    /// Like [`DbfReader::new`] with an explicit read buffer capacity.
    pub fn with_capacity(capacity: usize, reader: R) -> Result<Self> {
        let mut reader = BufReader::with_capacity(capacity, reader);

        let mut head = [0u8; TABLE_HEADER_BYTES];
        reader.read_exact(&mut head)?;
        let raw = RawTableHeader::read_from_bytes(&head[..])
            .map_err(|_| Error::InvalidData("Table header is truncated".to_string()))?;

        let header = TableHeader {
            version: raw.version,
            last_update: NaiveDate::from_ymd_opt(
                1900 + raw.updated[0] as i32,
                raw.updated[1] as u32,
                raw.updated[2] as u32,
            ),
            record_count: raw.record_count.get(),
            header_length: raw.header_length.get(),
            record_length: raw.record_length.get(),
            language_driver: raw.language_driver,
        };

        if (header.header_length as usize) < TABLE_HEADER_BYTES + 1 {
            return Err(Error::InvalidData(format!(
                "Table header length {} is too small",
                header.header_length
            )));
        }

        let mut descriptors = vec![0u8; header.header_length as usize - TABLE_HEADER_BYTES];
        reader.read_exact(&mut descriptors)?;

        let encoding = encoding::ldid_to_codepage(header.language_driver)
            .and_then(encoding::codepage_to_encoding)
            .unwrap_or(encoding_rs::UTF_8);

        let columns = parse_descriptors(&descriptors, encoding)?;

        let mut offsets = Vec::with_capacity(columns.len());
        let mut pos = 1usize;
        for column in &columns {
            offsets.push(pos);
            pos += column.length as usize;
        }
        if pos > header.record_length as usize {
            return Err(Error::InvalidData(format!(
                "Columns span {} bytes but rows are {} bytes long",
                pos, header.record_length
            )));
        }

        log::debug!(
            "Opened table: version {:#04x}, {} columns, {} rows, {}",
            header.version,
            columns.len(),
            header.record_count,
            encoding.name()
        );

        Ok(Self {
            reader: if header.record_count > 0 { Some(reader) } else { None },
            names: columns.iter().map(|c| c.name.clone()).collect(),
            row: vec![0u8; header.record_length as usize],
            header,
            columns,
            offsets,
            encoding,
            position: 0,
        })
    }

    /// Decode text with `encoding` instead of the code page from the header.
    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    #[inline]
    pub fn header(&self) -> &TableHeader {
        &self.header
    }

    #[inline]
    pub fn columns(&self) -> &[DbfColumn] {
        &self.columns
    }

    #[inline]
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    #[inline]
    pub fn record_count(&self) -> usize {
        self.header.record_count as usize
    }

    /// Rows read so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn close(&mut self) {
        self.reader = None;
    }

    fn read_row(&mut self) -> Result<Option<Vec<Value>>> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };

        // The end-of-file marker may come early in files with a stale count
        let mut flag = [0u8; 1];
        reader.read_exact(&mut flag)?;
        if flag[0] == EOF_MARKER {
            log::warn!(
                "Table ends after {} of {} declared rows",
                self.position,
                self.header.record_count
            );
            return Ok(None);
        }
        self.row[0] = flag[0];
        reader.read_exact(&mut self.row[1..])?;

        if flag[0] == DELETED_FLAG {
            log::warn!("Row {} is flagged as deleted", self.position + 1);
        }

        let mut values = Vec::with_capacity(self.columns.len());
        for (column, &offset) in self.columns.iter().zip(&self.offsets) {
            let raw = &self.row[offset..offset + column.length as usize];
            values.push(decode_value(column, raw, self.encoding)?);
        }
        Ok(Some(values))
    }
}

impl<R: Read> Iterator for DbfReader<R> {
    type Item = Result<Vec<Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.reader.is_none() || self.position >= self.record_count() {
            return None;
        }
        match self.read_row() {
            Ok(Some(values)) => {
                self.position += 1;
                if self.position >= self.record_count() {
                    self.close();
                }
                Some(Ok(values))
            },
            Ok(None) => {
                self.close();
                None
            },
            Err(e) => {
                self.close();
                Some(Err(e))
            },
        }
    }
}

impl<R: Read> AttributeSource for DbfReader<R> {
    fn columns(&self) -> &[String] {
        &self.names
    }

    fn next_row(&mut self) -> Option<Result<Vec<Value>>> {
        self.next()
    }
}

fn parse_descriptors(data: &[u8], encoding: &'static Encoding) -> Result<Vec<DbfColumn>> {
    let mut columns = Vec::new();
    let mut pos = 0usize;

    while pos < data.len() && data[pos] != HEADER_TERMINATOR {
        let chunk = data.get(pos..pos + DESCRIPTOR_BYTES).ok_or_else(|| {
            Error::InvalidData(format!("Column descriptor {} is truncated", columns.len() + 1))
        })?;
        let raw = RawColumnDescriptor::read_from_bytes(chunk).map_err(|_| {
            Error::InvalidData(format!("Column descriptor {} is malformed", columns.len() + 1))
        })?;

        let field_type = DbfFieldType::from_code(raw.field_type).ok_or_else(|| {
            Error::Unsupported(format!("Column type {:?}", raw.field_type as char))
        })?;

        columns.push(DbfColumn {
            name: encoding::decode_field(&raw.name, encoding),
            field_type,
            length: raw.length,
            decimals: raw.decimals,
        });
        pos += DESCRIPTOR_BYTES;
    }

    if pos >= data.len() {
        log::warn!("Column descriptors are not terminated");
    }
    Ok(columns)
}

/// Decode one fixed-width field.
pub(crate) fn decode_value(
    column: &DbfColumn,
    raw: &[u8],
    encoding: &'static Encoding,
) -> Result<Value> {
    let value = match column.field_type {
        DbfFieldType::Character => {
            let text = encoding::decode_field(raw, encoding);
            if text.is_empty() { Value::Null } else { Value::Text(text) }
        },
        DbfFieldType::Numeric | DbfFieldType::Float => decode_number(column, raw)?,
        DbfFieldType::Date => {
            let digits = trim_ascii(raw);
            if digits.is_empty() || digits.iter().all(|&b| b == b'0') {
                Value::Null
            } else {
                let text = std::str::from_utf8(digits).unwrap_or_default();
                match NaiveDate::parse_from_str(text, "%Y%m%d") {
                    Ok(date) => Value::Date(date),
                    Err(_) => {
                        log::warn!("Ignoring malformed date {:?} in column {}", text, column.name);
                        Value::Null
                    },
                }
            }
        },
        DbfFieldType::Logical => match raw.first() {
            Some(b'T' | b't' | b'Y' | b'y') => Value::Boolean(true),
            Some(b'F' | b'f' | b'N' | b'n') => Value::Boolean(false),
            _ => Value::Null,
        },
        DbfFieldType::Long | DbfFieldType::Autoincrement => {
            let bytes: [u8; 4] = raw.try_into().map_err(|_| width_error(column, raw))?;
            Value::Integer(i32::from_le_bytes(bytes) as i64)
        },
        DbfFieldType::Double => {
            let bytes: [u8; 8] = raw.try_into().map_err(|_| width_error(column, raw))?;
            Value::Float(f64::from_le_bytes(bytes))
        },
        DbfFieldType::Memo | DbfFieldType::Binary | DbfFieldType::Ole => {
            let trimmed = encoding::trim_trailing_spaces(raw);
            if trimmed.is_empty() || trimmed.iter().all(|&b| b == 0) {
                Value::Null
            } else {
                Value::Binary(Bytes::copy_from_slice(trimmed))
            }
        },
        DbfFieldType::Timestamp => {
            if raw.iter().all(|&b| b == 0 || b == b' ') {
                Value::Null
            } else {
                Value::Binary(Bytes::copy_from_slice(raw))
            }
        },
    };
    Ok(value)
}

fn decode_number(column: &DbfColumn, raw: &[u8]) -> Result<Value> {
    let digits = trim_ascii(raw);
    let digits = digits.strip_prefix(b"+").unwrap_or(digits);

    // Overflowed or unset numbers are stored as asterisks or question marks
    if digits.is_empty() || digits.iter().all(|&b| b == b'*' || b == b'?' || b == b'.') {
        return Ok(Value::Null);
    }

    if column.decimals == 0
        && memchr::memchr3(b'.', b'e', b'E', digits).is_none()
        && let Ok(i) = atoi_simd::parse::<i64, false, false>(digits)
    {
        return Ok(Value::Integer(i));
    }

    fast_float2::parse::<f64, _>(digits).map(Value::Float).map_err(|_| {
        Error::InvalidData(format!(
            "Column {} holds non-numeric value {:?}",
            column.name,
            String::from_utf8_lossy(digits)
        ))
    })
}

fn trim_ascii(raw: &[u8]) -> &[u8] {
    let end = memchr::memchr(0, raw).unwrap_or(raw.len());
    raw[..end].trim_ascii()
}

fn width_error(column: &DbfColumn, raw: &[u8]) -> Error {
    Error::InvalidData(format!(
        "Column {} of type {} is {} bytes wide",
        column.name,
        column.field_type,
        raw.len()
    ))
}
