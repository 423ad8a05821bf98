//! dBASE III table layout constants.

/// Version byte written for plain dBASE III tables
pub const DBASE3_VERSION: u8 = 0x03;

/// Size of the fixed table header
pub const TABLE_HEADER_BYTES: usize = 32;

/// Size of one column descriptor
pub const DESCRIPTOR_BYTES: usize = 32;

/// Byte ending the descriptor array
pub const HEADER_TERMINATOR: u8 = 0x0D;

/// Byte ending the row data
pub const EOF_MARKER: u8 = 0x1A;

/// Row flag of live rows
pub const ACTIVE_FLAG: u8 = b' ';

/// Row flag of deleted rows
pub const DELETED_FLAG: u8 = b'*';
