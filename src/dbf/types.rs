//! dBASE column types and descriptors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum column name length stored in a descriptor
pub const MAX_NAME_BYTES: usize = 10;

/// Storage type of a dBASE column.
///
/// Each type has a one-letter code stored in the column descriptor and a
/// long name used when editing table metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DbfFieldType {
    Character,
    Numeric,
    Date,
    Logical,
    Memo,
    Binary,
    Timestamp,
    Long,
    Autoincrement,
    Float,
    Double,
    Ole,
}

impl DbfFieldType {
    pub const ALL: [DbfFieldType; 12] = [
        DbfFieldType::Character,
        DbfFieldType::Numeric,
        DbfFieldType::Date,
        DbfFieldType::Logical,
        DbfFieldType::Memo,
        DbfFieldType::Binary,
        DbfFieldType::Timestamp,
        DbfFieldType::Long,
        DbfFieldType::Autoincrement,
        DbfFieldType::Float,
        DbfFieldType::Double,
        DbfFieldType::Ole,
    ];

    /// Descriptor code byte.
    pub fn code(self) -> u8 {
        match self {
            DbfFieldType::Character => b'C',
            DbfFieldType::Numeric => b'N',
            DbfFieldType::Date => b'D',
            DbfFieldType::Logical => b'L',
            DbfFieldType::Memo => b'M',
            DbfFieldType::Binary => b'B',
            DbfFieldType::Timestamp => b'@',
            DbfFieldType::Long => b'I',
            DbfFieldType::Autoincrement => b'+',
            DbfFieldType::Float => b'F',
            DbfFieldType::Double => b'O',
            DbfFieldType::Ole => b'G',
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    /// Long name used by the metadata model.
    pub fn name(self) -> &'static str {
        match self {
            DbfFieldType::Character => "character",
            DbfFieldType::Numeric => "numeric",
            DbfFieldType::Date => "date",
            DbfFieldType::Logical => "boolean",
            DbfFieldType::Memo => "memo",
            DbfFieldType::Binary => "binary",
            DbfFieldType::Timestamp => "timestamp",
            DbfFieldType::Long => "long",
            DbfFieldType::Autoincrement => "autoincrement",
            DbfFieldType::Float => "float",
            DbfFieldType::Double => "double",
            DbfFieldType::Ole => "OLE",
        }
    }

    /// Parse a one-letter code or a long name.
    ///
    /// Long names are matched ignoring ASCII case; `logical` is accepted as
    /// an alias of `boolean`.
    pub fn parse_token(token: &str) -> Option<Self> {
        let token = token.trim();
        if let [code] = token.as_bytes()
            && let Some(t) = Self::from_code(code.to_ascii_uppercase())
        {
            return Some(t);
        }
        if token.eq_ignore_ascii_case("logical") {
            return Some(DbfFieldType::Logical);
        }
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(token))
    }

    /// On-disk width for types whose width is fixed by the format.
    pub fn fixed_length(self) -> Option<u8> {
        match self {
            DbfFieldType::Date | DbfFieldType::Timestamp | DbfFieldType::Double => Some(8),
            DbfFieldType::Logical => Some(1),
            DbfFieldType::Long | DbfFieldType::Autoincrement => Some(4),
            _ => None,
        }
    }

    /// Whether values are stored as ASCII digits.
    pub fn is_numeric_text(self) -> bool {
        matches!(self, DbfFieldType::Numeric | DbfFieldType::Float)
    }

    /// Whether the column holds opaque bytes.
    pub fn is_binary(self) -> bool {
        matches!(
            self,
            DbfFieldType::Memo | DbfFieldType::Binary | DbfFieldType::Ole | DbfFieldType::Timestamp
        )
    }
}

impl fmt::Display for DbfFieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One column descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbfColumn {
    pub name: String,
    pub field_type: DbfFieldType,
    /// Width in bytes
    pub length: u8,
    /// Digits after the decimal point for numeric columns
    pub decimals: u8,
}

impl DbfColumn {
    pub fn new(name: impl Into<String>, field_type: DbfFieldType, length: u8, decimals: u8) -> Self {
        Self {
            name: name.into(),
            field_type,
            length,
            decimals,
        }
    }

    pub fn character(name: impl Into<String>, length: u8) -> Self {
        Self::new(name, DbfFieldType::Character, length, 0)
    }

    pub fn numeric(name: impl Into<String>, length: u8, decimals: u8) -> Self {
        Self::new(name, DbfFieldType::Numeric, length, decimals)
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, DbfFieldType::Date, 8, 0)
    }

    pub fn logical(name: impl Into<String>) -> Self {
        Self::new(name, DbfFieldType::Logical, 1, 0)
    }

    /// Width actually used on disk.
    pub fn storage_length(&self) -> u8 {
        self.field_type.fixed_length().unwrap_or(self.length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for t in DbfFieldType::ALL {
            assert_eq!(DbfFieldType::from_code(t.code()), Some(t));
        }
        assert_eq!(DbfFieldType::from_code(b'X'), None);
    }

    #[test]
    fn test_parse_token() {
        assert_eq!(DbfFieldType::parse_token("C"), Some(DbfFieldType::Character));
        assert_eq!(DbfFieldType::parse_token("n"), Some(DbfFieldType::Numeric));
        assert_eq!(DbfFieldType::parse_token("boolean"), Some(DbfFieldType::Logical));
        assert_eq!(DbfFieldType::parse_token("Logical"), Some(DbfFieldType::Logical));
        assert_eq!(DbfFieldType::parse_token("ole"), Some(DbfFieldType::Ole));
        assert_eq!(DbfFieldType::parse_token("@"), Some(DbfFieldType::Timestamp));
        assert_eq!(DbfFieldType::parse_token("+"), Some(DbfFieldType::Autoincrement));
        assert_eq!(DbfFieldType::parse_token("varchar"), None);
        assert_eq!(DbfFieldType::parse_token(""), None);
    }

    #[test]
    fn test_storage_length() {
        assert_eq!(DbfColumn::new("d", DbfFieldType::Date, 3, 0).storage_length(), 8);
        assert_eq!(DbfColumn::character("c", 40).storage_length(), 40);
        assert_eq!(DbfColumn::new("i", DbfFieldType::Long, 10, 0).storage_length(), 4);
    }
}
