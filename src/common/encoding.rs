//! Character encoding support for attribute tables.
//!
//! dBASE files record their code page as a one-byte language driver id in
//! the header; shapefiles may also ship a `.cpg` sibling naming the encoding.
//! Both are resolved to an `encoding_rs` encoding here.

use encoding_rs::Encoding;
use std::borrow::Cow;

/// Map a Windows code page number to an `encoding_rs` encoding.
///
/// Returns `None` for code pages `encoding_rs` cannot decode.
///
/// # Examples
/// ```
/// use shpio::common::encoding::codepage_to_encoding;
///
/// assert_eq!(codepage_to_encoding(1251).unwrap().name(), "windows-1251");
/// assert!(codepage_to_encoding(437).is_none());
/// ```
#[inline]
pub fn codepage_to_encoding(codepage: u32) -> Option<&'static Encoding> {
    match codepage {
        866 => Some(encoding_rs::IBM866),
        874 => Some(encoding_rs::WINDOWS_874),
        1250 => Some(encoding_rs::WINDOWS_1250),
        1251 => Some(encoding_rs::WINDOWS_1251),
        1252 => Some(encoding_rs::WINDOWS_1252),
        1253 => Some(encoding_rs::WINDOWS_1253),
        1254 => Some(encoding_rs::WINDOWS_1254),
        1255 => Some(encoding_rs::WINDOWS_1255),
        1256 => Some(encoding_rs::WINDOWS_1256),
        1257 => Some(encoding_rs::WINDOWS_1257),
        1258 => Some(encoding_rs::WINDOWS_1258),

        932 => Some(encoding_rs::SHIFT_JIS),
        936 => Some(encoding_rs::GBK),
        949 => Some(encoding_rs::EUC_KR),
        950 => Some(encoding_rs::BIG5),
        54936 => Some(encoding_rs::GB18030),

        28591 => Some(encoding_rs::WINDOWS_1252),
        28592 => Some(encoding_rs::ISO_8859_2),
        28595 => Some(encoding_rs::ISO_8859_5),
        28597 => Some(encoding_rs::ISO_8859_7),
        28605 => Some(encoding_rs::ISO_8859_15),
        20866 => Some(encoding_rs::KOI8_R),

        10000 => Some(encoding_rs::MACINTOSH),
        65001 => Some(encoding_rs::UTF_8),
        _ => None,
    }
}

/// Code page of a dBASE language driver id, `None` when unknown or unset.
pub fn ldid_to_codepage(ldid: u8) -> Option<u32> {
    match ldid {
        0x01 => Some(437),
        0x02 => Some(850),
        0x03 | 0x57 => Some(1252),
        0x04 => Some(10000),
        0x13 | 0x7B => Some(932),
        0x26 | 0x65 => Some(866),
        0x64 => Some(852),
        0x78 => Some(950),
        0x79 => Some(949),
        0x7A => Some(936),
        0x7C => Some(874),
        0x7D => Some(1255),
        0x7E => Some(1256),
        0xC8 => Some(1250),
        0xC9 => Some(1251),
        0xCA => Some(1254),
        0xCB => Some(1253),
        0xCC => Some(1257),
        _ => None,
    }
}

/// Language driver id to store for `encoding`, `0` when none fits.
pub fn encoding_to_ldid(encoding: &'static Encoding) -> u8 {
    match encoding.name() {
        "windows-1252" => 0x57,
        "windows-1250" => 0xC8,
        "windows-1251" => 0xC9,
        "windows-1253" => 0xCB,
        "windows-1254" => 0xCA,
        "windows-1255" => 0x7D,
        "windows-1256" => 0x7E,
        "windows-1257" => 0xCC,
        "windows-874" => 0x7C,
        "IBM866" => 0x65,
        "Shift_JIS" => 0x7B,
        "GBK" => 0x7A,
        "EUC-KR" => 0x79,
        "Big5" => 0x78,
        "macintosh" => 0x04,
        _ => 0,
    }
}

/// Resolve the content of a `.cpg` file.
///
/// Accepts WHATWG labels (`UTF-8`, `latin1`, ...) and bare or prefixed code
/// page numbers (`1252`, `ANSI 1251`, `CP1250`).
pub fn encoding_from_cpg(content: &str) -> Option<&'static Encoding> {
    let label = content.trim();
    if label.is_empty() {
        return None;
    }
    if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
        return Some(encoding);
    }
    let digits_at = label.find(|c: char| c.is_ascii_digit())?;
    let codepage = atoi_simd::parse::<u32, false, false>(label[digits_at..].trim().as_bytes()).ok()?;
    codepage_to_encoding(codepage)
}

/// Decode a fixed-width text field.
///
/// The field ends at the first NUL; trailing blanks are removed. Invalid
/// sequences are replaced with U+FFFD.
pub fn decode_field(bytes: &[u8], encoding: &'static Encoding) -> String {
    let end = memchr::memchr(0, bytes).unwrap_or(bytes.len());
    let bytes = trim_trailing_spaces(&bytes[..end]);
    let (text, _) = encoding.decode_without_bom_handling(bytes);
    text.into_owned()
}

/// Encode text for a fixed-width field.
///
/// Characters the encoding cannot represent are replaced with numeric
/// character references by `encoding_rs`; a warning is logged when that
/// happens.
pub fn encode_text<'a>(text: &'a str, encoding: &'static Encoding) -> Cow<'a, [u8]> {
    let (bytes, _, had_errors) = encoding.encode(text);
    if had_errors {
        log::warn!("Text {:?} is not representable in {}", text, encoding.name());
    }
    bytes
}

#[inline]
pub fn trim_trailing_spaces(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|&b| b != b' ').map_or(0, |p| p + 1);
    &bytes[..end]
}
