//! Hex dump rendering.
//!
//! Each row holds up to [`BYTES_PER_ROW`] bytes and looks like
//!
//! ```text
//! <indent>48 65 6C 6C 6F                                  Hello
//! ```
//!
//! The hex column is padded to the width of a full row, followed by one space
//! and the printable ASCII for the row's bytes. Rows are separated by `\n`,
//! with no newline after the last row.

use alloc::string::{String, ToString};
use core::cmp;
use core::fmt;

/// Bytes shown on each row
pub const BYTES_PER_ROW: usize = 16;

/// Width of the hex column of a full row: two digits per byte, one space
/// between bytes
pub const HEX_COLUMN_WIDTH: usize = BYTES_PER_ROW * 3 - 1;

/// Stands in for bytes with no printable ASCII form
pub const PLACEHOLDER: char = '.';

/// Hex dump of the first `max_bytes` bytes of a buffer
#[derive(Debug, Clone, Copy)]
pub struct HexDump<'a> {
    data: &'a [u8],
    indent: usize,
}

impl<'a> HexDump<'a> {
    /// Dump at most `max_bytes` of `data`, each row indented by `indent`
    /// spaces
    pub fn new(data: &'a [u8], max_bytes: usize, indent: usize) -> Self {
        let byte_count = cmp::min(max_bytes, data.len());
        Self {
            data: &data[..byte_count],
            indent,
        }
    }

    fn write_row(&self, f: &mut fmt::Formatter<'_>, row: &[u8]) -> fmt::Result {
        write!(f, "{:indent$}", "", indent = self.indent)?;

        for (col, byte) in row.iter().enumerate() {
            if col > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02X}", byte)?;
        }

        let hex_width = row.len() * 3 - 1;
        write!(f, "{:pad$} ", "", pad = HEX_COLUMN_WIDTH - hex_width)?;

        for &byte in row {
            let c = if (0x20..=0x7e).contains(&byte) { byte as char } else { PLACEHOLDER };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, row) in self.data.chunks(BYTES_PER_ROW).enumerate() {
            if index > 0 {
                f.write_str("\n")?;
            }
            self.write_row(f, row)?;
        }
        Ok(())
    }
}

/// Render up to `max_bytes` bytes of `data` as a hex dump, indenting every
/// row by `indent` spaces. Returns an empty string when there is nothing to
/// show.
pub fn render(data: &[u8], max_bytes: usize, indent: usize) -> String {
    HexDump::new(data, max_bytes, indent).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn hello_row() {
        let hello = [0x48, 0x65, 0x6C, 0x6C, 0x6F];
        assert_eq!(
            render(&hello, 5, 0),
            "48 65 6C 6C 6F                                  Hello"
        );
    }

    #[test]
    fn ascii_starts_after_full_hex_column() {
        let line = render(b"Hi", 2, 0);
        assert_eq!(line.find('H'), Some(HEX_COLUMN_WIDTH + 1));
    }

    #[test]
    fn nothing_to_render() {
        assert_eq!(render(b"abc", 0, 4), "");
        assert_eq!(render(&[], 16, 4), "");
    }

    #[test]
    fn truncates_to_max_bytes() {
        assert_eq!(render(b"abcdef", 3, 0), render(b"abc", 3, 0));
        assert!(render(b"abcdef", 3, 0).ends_with(" abc"));
    }

    #[test]
    fn max_bytes_beyond_data_renders_data_only() {
        assert_eq!(render(b"ab", 100, 0), render(b"ab", 2, 0));
    }

    #[test]
    fn wraps_rows_with_indent() {
        let data: Vec<u8> = (0..20).collect();
        let dump = render(&data, data.len(), 2);
        let rows: Vec<&str> = dump.split('\n').collect();

        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            "  00 01 02 03 04 05 06 07 08 09 0A 0B 0C 0D 0E 0F ................"
        );
        assert_eq!(rows[1], format!("  10 11 12 13{} ....", " ".repeat(HEX_COLUMN_WIDTH - 11)));
        assert!(!dump.ends_with('\n'));
    }

    #[test]
    fn non_printable_bytes_use_placeholder() {
        let dump = render(&[0x41, 0x7f, 0x20, 0xff, 0x7e], 5, 0);
        assert!(dump.ends_with(" A. .~"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let data: Vec<u8> = (0..=255).collect();
        assert_eq!(render(&data, 200, 3), render(&data, 200, 3));
        assert_eq!(render(&data, 200, 3), HexDump::new(&data, 200, 3).to_string());
    }
}
