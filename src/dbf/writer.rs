//! dBASE III table writer.

use super::consts::*;
use super::schema::MAX_CHARACTER_LENGTH;
use super::types::{DbfColumn, DbfFieldType, MAX_NAME_BYTES};
use crate::common::encoding;
use crate::common::error::{Error, Result};
use crate::record::Value;
use chrono::{Datelike, Local, NaiveDate};
use encoding_rs::Encoding;
use std::io::Write;

static NULL: Value = Value::Null;

/// Writer for `.dbf` tables.
pub struct DbfWriter<W: Write> {
    writer: W,
    encoding: &'static Encoding,
    date: NaiveDate,
    /// Scratch buffer for one row
    row: Vec<u8>,
}

impl<W: Write> DbfWriter<W> {
    /// Create a writer encoding text as UTF-8 and stamping today's date.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            encoding: encoding_rs::UTF_8,
            date: Local::now().date_naive(),
            row: Vec::new(),
        }
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Override the last-update date stored in the header.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    /// Write the header, descriptors and every row.
    ///
    /// Each row yields one value per column; missing trailing values are
    /// written blank.
    pub fn write<'a, I, R>(&mut self, columns: &[DbfColumn], rows: I) -> Result<()>
    where
        I: IntoIterator<Item = R>,
        I::IntoIter: ExactSizeIterator,
        R: IntoIterator<Item = &'a Value>,
    {
        let rows = rows.into_iter();
        let record_count = u32::try_from(rows.len())
            .map_err(|_| Error::InvalidData(format!("{} rows exceed the table limit", rows.len())))?;

        let record_length: usize = 1 + columns.iter().map(|c| c.storage_length() as usize).sum::<usize>();
        let record_length = u16::try_from(record_length).map_err(|_| {
            Error::InvalidAttribute(format!("Row width {} exceeds the table limit", record_length))
        })?;
        let header_length = TABLE_HEADER_BYTES + columns.len() * DESCRIPTOR_BYTES + 1;
        let header_length = u16::try_from(header_length).map_err(|_| {
            Error::InvalidAttribute(format!("{} columns exceed the table limit", columns.len()))
        })?;

        self.write_header(record_count, header_length, record_length)?;
        for (column, name) in columns.iter().zip(descriptor_names(columns, self.encoding)) {
            self.write_descriptor(column, &name)?;
        }
        self.writer.write_all(&[HEADER_TERMINATOR])?;

        for (i, row) in rows.enumerate() {
            self.row.clear();
            self.row.push(ACTIVE_FLAG);

            let mut values = row.into_iter();
            for column in columns {
                let value = values.next().unwrap_or(&NULL);
                encode_value(&mut self.row, column, value, self.encoding)
                    .map_err(|e| annotate(e, i + 1))?;
            }
            if values.next().is_some() {
                return Err(Error::InvalidAttribute(format!(
                    "Row {} holds more values than the {} columns",
                    i + 1,
                    columns.len()
                )));
            }
            self.writer.write_all(&self.row)?;
        }

        self.writer.write_all(&[EOF_MARKER])?;
        self.writer.flush()?;

        log::debug!("Wrote table: {} columns, {} rows", columns.len(), record_count);
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_header(&mut self, record_count: u32, header_length: u16, record_length: u16) -> Result<()> {
        let mut header = [0u8; TABLE_HEADER_BYTES];
        header[0] = DBASE3_VERSION;
        header[1] = (self.date.year() - 1900).clamp(0, 255) as u8;
        header[2] = self.date.month() as u8;
        header[3] = self.date.day() as u8;
        header[4..8].copy_from_slice(&record_count.to_le_bytes());
        header[8..10].copy_from_slice(&header_length.to_le_bytes());
        header[10..12].copy_from_slice(&record_length.to_le_bytes());
        header[29] = encoding::encoding_to_ldid(self.encoding);
        self.writer.write_all(&header)?;
        Ok(())
    }

    fn write_descriptor(&mut self, column: &DbfColumn, name: &[u8]) -> Result<()> {
        let mut descriptor = [0u8; DESCRIPTOR_BYTES];
        descriptor[..name.len()].copy_from_slice(name);

        descriptor[11] = column.field_type.code();
        descriptor[16] = column.storage_length();
        descriptor[17] = if column.field_type.is_numeric_text() { column.decimals } else { 0 };
        self.writer.write_all(&descriptor)?;
        Ok(())
    }
}

/// Append the fixed-width encoding of `value` for `column`.
pub(crate) fn encode_value(
    row: &mut Vec<u8>,
    column: &DbfColumn,
    value: &Value,
    encoding: &'static Encoding,
) -> Result<()> {
    let width = column.storage_length() as usize;

    match column.field_type {
        DbfFieldType::Character => {
            let text = match value {
                Value::Null => String::new(),
                Value::Text(s) => s.clone(),
                Value::Binary(_) | Value::Geometry(_) => return Err(mismatch(column, value)),
                other => other.to_string(),
            };
            let encoded = encoding::encode_text(&text, encoding);
            let bytes = truncate(&text, &encoded, width.min(MAX_CHARACTER_LENGTH as usize), encoding);
            if bytes.len() < encoded.len() {
                log::warn!("Value truncated to {} bytes in column {}", width, column.name);
            }
            pad_right(row, bytes, width, b' ');
        },
        DbfFieldType::Numeric | DbfFieldType::Float => {
            let text = match value {
                Value::Null => String::new(),
                Value::Integer(i) if column.decimals == 0 => itoa::Buffer::new().format(*i).to_string(),
                Value::Integer(i) => format!("{:.*}", column.decimals as usize, *i as f64),
                Value::Float(f) => format_float(*f, column.decimals),
                Value::Boolean(b) => (if *b { "1" } else { "0" }).to_string(),
                _ => return Err(mismatch(column, value)),
            };
            if text.len() > width {
                return Err(Error::InvalidAttribute(format!(
                    "Number {} does not fit column {} of width {}",
                    text, column.name, width
                )));
            }
            row.resize(row.len() + width - text.len(), b' ');
            row.extend_from_slice(text.as_bytes());
        },
        DbfFieldType::Date => match value {
            Value::Null => pad_right(row, b"", width, b' '),
            Value::Date(d) => {
                let text = d.format("%Y%m%d").to_string();
                pad_right(row, text.as_bytes(), width, b' ');
            },
            _ => return Err(mismatch(column, value)),
        },
        DbfFieldType::Logical => {
            let flag = match value {
                Value::Null => b'?',
                Value::Boolean(true) => b'T',
                Value::Boolean(false) => b'F',
                _ => return Err(mismatch(column, value)),
            };
            row.push(flag);
        },
        DbfFieldType::Long | DbfFieldType::Autoincrement => {
            let n = match value {
                Value::Null => 0,
                Value::Integer(i) => i32::try_from(*i).map_err(|_| {
                    Error::InvalidAttribute(format!("{} overflows long column {}", i, column.name))
                })?,
                _ => return Err(mismatch(column, value)),
            };
            row.extend_from_slice(&n.to_le_bytes());
        },
        DbfFieldType::Double => {
            let f = match value {
                Value::Null => 0.0,
                Value::Float(f) => *f,
                Value::Integer(i) => *i as f64,
                _ => return Err(mismatch(column, value)),
            };
            row.extend_from_slice(&f.to_le_bytes());
        },
        DbfFieldType::Memo | DbfFieldType::Binary | DbfFieldType::Ole | DbfFieldType::Timestamp => {
            let fill = if column.field_type == DbfFieldType::Timestamp { 0 } else { b' ' };
            let bytes: &[u8] = match value {
                Value::Null => b"",
                Value::Binary(b) => b,
                _ => return Err(mismatch(column, value)),
            };
            if bytes.len() > width {
                return Err(Error::InvalidAttribute(format!(
                    "{} bytes do not fit column {} of width {}",
                    bytes.len(),
                    column.name,
                    width
                )));
            }
            pad_right(row, bytes, width, fill);
        },
    }
    Ok(())
}

fn format_float(value: f64, decimals: u8) -> String {
    if !value.is_finite() {
        return String::new();
    }
    if decimals > 0 {
        return format!("{:.*}", decimals as usize, value);
    }
    if value.fract() == 0.0 && value.abs() < 1e18 {
        return itoa::Buffer::new().format(value as i64).to_string();
    }
    ryu::Buffer::new().format_finite(value).to_string()
}

fn pad_right(row: &mut Vec<u8>, bytes: &[u8], width: usize, fill: u8) {
    row.extend_from_slice(bytes);
    row.resize(row.len() + width - bytes.len(), fill);
}

/// Encoded column names cut to the descriptor width. Names that collide
/// after cutting, ignoring ASCII case, get a `_n` suffix.
fn descriptor_names(columns: &[DbfColumn], encoding: &'static Encoding) -> Vec<Vec<u8>> {
    let mut names: Vec<Vec<u8>> = Vec::with_capacity(columns.len());
    for column in columns {
        let encoded = encoding::encode_text(&column.name, encoding);
        let mut name = truncate(&column.name, &encoded, MAX_NAME_BYTES, encoding).to_vec();

        let mut n = 0;
        while names.iter().any(|taken| taken.eq_ignore_ascii_case(&name)) {
            n += 1;
            let suffix = format!("_{}", n);
            let stem = truncate(&column.name, &encoded, MAX_NAME_BYTES.saturating_sub(suffix.len()), encoding);
            name = [stem, suffix.as_bytes()].concat();
        }

        if n > 0 {
            log::warn!("Column name {:?} renamed to {:?}", column.name, String::from_utf8_lossy(&name));
        } else if name.len() < encoded.len() {
            log::warn!("Column name {:?} truncated to {} bytes", column.name, name.len());
        }
        names.push(name);
    }
    names
}

/// Cut `encoded` to at most `max` bytes without splitting a UTF-8 sequence.
fn truncate<'a>(text: &str, encoded: &'a [u8], max: usize, encoding: &'static Encoding) -> &'a [u8] {
    if encoded.len() <= max {
        return encoded;
    }
    let mut end = max;
    if encoding == encoding_rs::UTF_8 {
        while end > 0 && !text.is_char_boundary(end) {
            end -= 1;
        }
    }
    &encoded[..end]
}

fn mismatch(column: &DbfColumn, value: &Value) -> Error {
    Error::InvalidAttribute(format!(
        "{} value cannot be stored in {} column {}",
        value.value_type(),
        column.field_type,
        column.name
    ))
}

fn annotate(err: Error, row: usize) -> Error {
    match err {
        Error::InvalidAttribute(msg) => Error::InvalidAttribute(format!("row {}: {}", row, msg)),
        other => other,
    }
}
