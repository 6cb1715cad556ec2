//! UTF-16 offset helpers
//!
//! DOM ranges count offsets in UTF-16 code units, while `regex` reports
//! byte offsets into a `str`. Everything that leaves the matcher is
//! converted to UTF-16 here.

/// Length of `text` in UTF-16 code units.
pub fn utf16_len(text: &str) -> u32 {
    text.encode_utf16().count() as u32
}

/// Extract the text between two UTF-16 offsets.
///
/// Returns `None` when the offsets are out of bounds or split a surrogate pair.
pub fn utf16_slice(text: &str, start: u32, end: u32) -> Option<String> {
    if start > end {
        return None;
    }
    let units: Vec<u16> = text.encode_utf16().collect();
    let slice = units.get(start as usize..end as usize)?;
    String::from_utf16(slice).ok()
}

/// Forward-moving byte offset → UTF-16 offset converter.
///
/// Matches of a single pattern arrive in ascending order, so each
/// conversion only encodes the bytes since the previous one.
pub(crate) struct Utf16Cursor<'a> {
    text: &'a str,
    byte: usize,
    unit: u32,
}

impl<'a> Utf16Cursor<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self { text, byte: 0, unit: 0 }
    }

    /// `byte` must lie on a char boundary.
    pub(crate) fn offset_at(&mut self, byte: usize) -> u32 {
        if byte < self.byte {
            self.byte = 0;
            self.unit = 0;
        }
        self.unit += self.text[self.byte..byte].encode_utf16().count() as u32;
        self.byte = byte;
        self.unit
    }
}
