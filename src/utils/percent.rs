//! `%XX` escaping as used by the `CIMMethod`, `CIMObject` and `PGErrorDetail` headers.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PercentDecodeError {
    #[error("truncated escape sequence at offset {offset}")]
    Truncated { offset: usize },

    #[error("invalid hex digits in escape sequence at offset {offset}")]
    InvalidHex { offset: usize },

    #[error("decoded bytes are not valid UTF-8")]
    InvalidUtf8,
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Decode `%XX` sequences. The decoded byte sequence must be UTF-8.
pub fn percent_decode(input: &str) -> Result<String, PercentDecodeError> {
    if !input.contains('%') {
        return Ok(input.to_owned());
    }

    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let (Some(&hi), Some(&lo)) = (bytes.get(i + 1), bytes.get(i + 2)) else {
                return Err(PercentDecodeError::Truncated { offset: i });
            };
            let (Some(hi), Some(lo)) = (hex_value(hi), hex_value(lo)) else {
                return Err(PercentDecodeError::InvalidHex { offset: i });
            };
            out.push(hi << 4 | lo);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(out).map_err(|_| PercentDecodeError::InvalidUtf8)
}

/// Escape spaces, control characters, non-ASCII bytes and `%` itself.
pub fn percent_encode(input: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";

    let mut out = String::with_capacity(input.len());
    for &b in input.as_bytes() {
        if (0x21..0x7f).contains(&b) && b != b'%' {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0f) as usize] as char);
        }
    }
    out
}
