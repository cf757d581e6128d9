/// Position and length of the first malformed UTF-8 sequence in a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Utf8Violation {
    pub offset: usize,
    pub len: Option<usize>,
}

/// Scan `payload` for UTF-8 well-formedness, returning the first invalid sequence.
///
/// Overlong encodings, surrogates and code points beyond U+10FFFF are all rejected,
/// as is a sequence truncated by the end of the buffer (`len == None`).
pub fn check_utf8(payload: &[u8]) -> Result<&str, Utf8Violation> {
    std::str::from_utf8(payload).map_err(|e| Utf8Violation {
        offset: e.valid_up_to(),
        len: e.error_len(),
    })
}
