//! Low level readers shared by the wasm and source map front ends.

use crate::config::WasmNameDecoding;
use crate::error::{Error, Result};

pub fn read_u8(bytes: &[u8], cursor: usize) -> Result<(u8, usize)> {
    let byte = *bytes.get(cursor).ok_or(Error::Truncated(cursor))?;
    Ok((byte, cursor + 1))
}

pub fn read_u32_le(bytes: &[u8], cursor: usize) -> Result<(u32, usize)> {
    let end = cursor + 4;
    let chunk = bytes.get(cursor..end).ok_or(Error::Truncated(cursor))?;
    let value = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    Ok((value, end))
}

/// Decodes one unsigned LEB128 value starting at `cursor` and returns it
/// together with the offset of the first byte after it.
///
/// Only values that fit in 32 bits are supported, which covers every length,
/// count and index the wasm binary format stores this way. Anything larger is
/// reported as [`Error::VarintOverflow`] instead of being wrapped.
pub fn read_unsigned_varint(bytes: &[u8], cursor: usize) -> Result<(u32, usize)> {
    let start = cursor;
    let mut cursor = cursor;
    let mut value = 0u32;
    let mut shift = 0u32;
    loop {
        let (byte, next) = read_u8(bytes, cursor)?;
        cursor = next;
        let low = u32::from(byte & 0x7f);
        if shift == 28 && low > 0x0f {
            return Err(Error::VarintOverflow(start));
        }
        value |= low << shift;
        if byte & 0x80 == 0 {
            return Ok((value, cursor));
        }
        shift += 7;
        if shift > 28 {
            return Err(Error::VarintOverflow(start));
        }
    }
}

/// Reads a varint byte length followed by that many bytes of name.
pub fn read_length_prefixed_string(
    bytes: &[u8],
    cursor: usize,
    decoding: WasmNameDecoding,
) -> Result<(String, usize)> {
    let (length, cursor) = read_unsigned_varint(bytes, cursor)?;
    let end = cursor + length as usize;
    let raw = bytes.get(cursor..end).ok_or(Error::Truncated(cursor))?;
    let name = match decoding {
        WasmNameDecoding::Utf8 => String::from_utf8_lossy(raw).into_owned(),
        WasmNameDecoding::Latin1 => raw.iter().map(|&b| char::from(b)).collect(),
    };
    Ok((name, end))
}

const BASE64_ALPHABET: &[u8; 65] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/=";

fn base64_value(c: char) -> Result<u32> {
    BASE64_ALPHABET
        .iter()
        .position(|&b| char::from(b) == c)
        .map(|p| p as u32)
        .ok_or(Error::InvalidVlq(c))
}

/// Decodes every base64 VLQ value of one source map segment.
///
/// Each character carries five value bits plus a continuation bit (0x20).
/// Once a value is complete its lowest bit is the sign.
pub fn decode_vlq_segment(segment: &str) -> Result<Vec<i64>> {
    let mut values = Vec::new();
    let mut accumulated = 0i64;
    let mut shift = 0u32;
    for c in segment.chars() {
        let bits = base64_value(c)?;
        if shift > 58 {
            return Err(Error::InvalidVlq(c));
        }
        accumulated |= i64::from(bits & 0x1f) << shift;
        if bits & 0x20 != 0 {
            shift += 5;
            continue;
        }
        let negative = accumulated & 1 == 1;
        let magnitude = accumulated >> 1;
        values.push(if negative { -magnitude } else { magnitude });
        accumulated = 0;
        shift = 0;
    }
    Ok(values)
}

/// Byte offsets at which each line of a text file starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &[u8]) -> Self {
        let mut starts = vec![0];
        starts.extend(
            text.iter()
                .enumerate()
                .filter(|(_, &b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            starts,
            len: text.len(),
        }
    }

    pub fn line_starts(&self) -> &[usize] {
        &self.starts
    }

    /// Converts a zero-based line and column into an absolute byte offset.
    ///
    /// Positions outside the file are clamped to the closest valid one and a
    /// warning is logged.
    pub fn offset(&self, line: usize, column: usize) -> usize {
        let last_line = self.starts.len() - 1;
        let mut line = line;
        if line > last_line {
            tracing::warn!(
                "input file does not have a line:col {}:{}, it only has {} lines",
                line + 1,
                column + 1,
                self.starts.len()
            );
            line = last_line;
        }

        let line_start = self.starts[line];
        let line_len = match self.starts.get(line + 1) {
            Some(next) => next - line_start,
            None => self.len - line_start,
        };
        let mut column = column;
        if line < last_line && column >= line_len {
            tracing::warn!(
                "input file does not have a line:col {}:{}, that line only has {} columns",
                line + 1,
                column + 1,
                line_len
            );
            column = line_len - 1;
        } else if line == last_line && column > line_len {
            tracing::warn!(
                "input file does not have a line:col {}:{}, the last line only has {} columns",
                line + 1,
                column + 1,
                line_len
            );
            column = line_len;
        }
        line_start + column
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_single_and_multi_byte() {
        assert_eq!(read_unsigned_varint(&[0x05], 0).unwrap(), (5, 1));
        assert_eq!(read_unsigned_varint(&[0xe5, 0x8e, 0x26], 0).unwrap(), (624485, 3));
        assert_eq!(read_unsigned_varint(&[0x00, 0x80, 0x01], 1).unwrap(), (128, 3));
        assert_eq!(
            read_unsigned_varint(&[0xff, 0xff, 0xff, 0xff, 0x0f], 0).unwrap(),
            (u32::MAX, 5)
        );
    }

    #[test]
    fn varint_rejects_more_than_32_bits() {
        assert!(matches!(
            read_unsigned_varint(&[0xff, 0xff, 0xff, 0xff, 0x1f], 0),
            Err(Error::VarintOverflow(0))
        ));
        assert!(matches!(
            read_unsigned_varint(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x01], 0),
            Err(Error::VarintOverflow(0))
        ));
    }

    #[test]
    fn varint_truncated() {
        assert!(matches!(
            read_unsigned_varint(&[0x80, 0x80], 0),
            Err(Error::Truncated(2))
        ));
    }

    #[test]
    fn strings_are_length_prefixed() {
        let bytes = [4, b'n', b'a', b'm', b'e', 0xff];
        let (name, cursor) = read_length_prefixed_string(&bytes, 0, WasmNameDecoding::Utf8).unwrap();
        assert_eq!(name, "name");
        assert_eq!(cursor, 5);

        assert!(read_length_prefixed_string(&[9, b'a'], 0, WasmNameDecoding::Utf8).is_err());
    }

    #[test]
    fn string_decodings_differ_on_multibyte() {
        let bytes = [2, 0xc3, 0xa9];
        let (utf8, _) = read_length_prefixed_string(&bytes, 0, WasmNameDecoding::Utf8).unwrap();
        let (latin1, _) = read_length_prefixed_string(&bytes, 0, WasmNameDecoding::Latin1).unwrap();
        assert_eq!(utf8, "é");
        assert_eq!(latin1, "Ã©");
    }

    #[test]
    fn vlq_segments() {
        assert_eq!(decode_vlq_segment("AAAA").unwrap(), vec![0, 0, 0, 0]);
        assert_eq!(decode_vlq_segment("SAAAA").unwrap(), vec![9, 0, 0, 0, 0]);
        assert_eq!(decode_vlq_segment("D").unwrap(), vec![-1]);
        assert_eq!(decode_vlq_segment("gB").unwrap(), vec![16]);
        assert_eq!(decode_vlq_segment("2Hw+B").unwrap(), vec![123, 1000]);
        assert!(matches!(decode_vlq_segment("A!"), Err(Error::InvalidVlq('!'))));
    }

    #[test]
    fn line_index_maps_and_clamps() {
        let index = LineIndex::new(b"ab\ncde\n\nf");
        assert_eq!(index.line_starts(), &[0, 3, 7, 8]);
        assert_eq!(index.offset(0, 1), 1);
        assert_eq!(index.offset(1, 2), 5);
        assert_eq!(index.offset(3, 0), 8);
        // Past the end of line 1 clamps to its last byte.
        assert_eq!(index.offset(1, 10), 6);
        // Past the last line clamps to the last line.
        assert_eq!(index.offset(9, 0), 8);
        assert_eq!(index.offset(3, 7), 9);
    }
}
