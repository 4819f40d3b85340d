// veridkim – verification of DKIM signatures
// Copyright © 2026 The veridkim developers
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.

//! Representation of email header fields.
//!
//! See RFC 5322, section 2.2.

use bstr::ByteSlice;
use std::{
    error::Error,
    fmt::{self, Debug, Display, Formatter},
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HeaderError;

impl Display for HeaderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "malformed header field")
    }
}

impl Error for HeaderError {}

/// A single unfolded header field.
///
/// The name is kept in two forms: `raw_name` exactly as received (including
/// any surrounding whitespace tolerated by the obsolete RFC 5322 syntax),
/// and `lower_name`, the trimmed, ASCII-lowercased form used for matching.
/// `raw_value` holds the value bytes with internal CRLF-WSP folding
/// preserved; the terminating CRLF of the last folded line is implicit and
/// re-appended on output, so that `raw_name + ":" + raw_value + CRLF`
/// reconstructs the original line block.
#[derive(Clone, Eq, PartialEq)]
pub struct Header {
    raw_name: Box<str>,
    lower_name: Box<str>,
    raw_value: Box<[u8]>,
}

impl Header {
    pub fn new(
        name: impl Into<Box<str>>,
        value: impl Into<Box<[u8]>>,
    ) -> Result<Self, HeaderError> {
        let raw_name = name.into();
        let raw_value = value.into();

        if !is_valid_name(&raw_name) || !is_valid_value(&raw_value) {
            return Err(HeaderError);
        }

        let lower_name = raw_name.trim().to_ascii_lowercase().into();

        Ok(Self {
            raw_name,
            lower_name,
            raw_value,
        })
    }

    /// The field name as received, without the colon.
    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }

    /// The trimmed, ASCII-lowercased field name.
    pub fn lower_name(&self) -> &str {
        &self.lower_name
    }

    /// The field value as received, internal folding included, without the
    /// terminating CRLF.
    pub fn raw_value(&self) -> &[u8] {
        &self.raw_value
    }

    /// Compares the field name case-insensitively.
    pub fn is_named(&self, name: &str) -> bool {
        self.lower_name.eq_ignore_ascii_case(name.trim())
    }
}

impl Debug for Header {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Header")
            .field("name", &self.raw_name)
            .field("value", &self.raw_value.as_bstr())
            .finish()
    }
}

fn is_valid_name(s: &str) -> bool {
    // Printable ASCII without colon; WSP is tolerated around and inside the
    // name (RFC 5322 obsolete syntax allows whitespace before the colon).
    !s.trim().is_empty()
        && s.chars()
            .all(|c| c != ':' && (c.is_ascii_graphic() || c == ' ' || c == '\t'))
}

fn is_valid_value(value: &[u8]) -> bool {
    for (i, line) in value.split_str("\r\n").enumerate() {
        // no stray CR or LF outside of CRLF pairs
        if line.iter().any(|&b| b == b'\r' || b == b'\n') {
            return false;
        }

        // continuation lines must be folded, ie start with WSP
        if i != 0 && !line.starts_with(b" ") && !line.starts_with(b"\t") {
            return false;
        }
    }

    true
}
