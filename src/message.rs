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

//! Message parsing.
//!
//! An email message is split into a header block and a body at the first
//! empty line, after normalizing all line endings to CRLF. Folded headers
//! are unfolded into [`Header`] values that preserve the original folding
//! bytes, as required by the *simple* canonicalization algorithm.

use crate::header::Header;
use bstr::ByteSlice;
use std::{
    error::Error,
    fmt::{self, Debug, Display, Formatter},
    str,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InvalidMessage {
    Empty,
    UnterminatedHeaderBlock,
    LeadingContinuationLine,
    MissingColon,
    InvalidHeader,
}

impl Display for InvalidMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty message"),
            Self::UnterminatedHeaderBlock => write!(f, "header block not terminated by CRLF"),
            Self::LeadingContinuationLine => write!(f, "first header line is a continuation line"),
            Self::MissingColon => write!(f, "header line without colon"),
            Self::InvalidHeader => write!(f, "malformed header field"),
        }
    }
}

impl Error for InvalidMessage {}

/// A parsed email message.
#[derive(Clone, Eq, PartialEq)]
pub struct Message {
    raw: Box<[u8]>,
    headers: Box<[Header]>,
    body: Box<[u8]>,
}

impl Message {
    /// Parses a raw message into header fields and body.
    ///
    /// Line endings are normalized to CRLF first, so `headers` and `body`
    /// are CRLF-clean regardless of the input convention. The header/body
    /// split is at the first empty line; a message without one consists of
    /// headers only.
    pub fn parse(input: &[u8]) -> Result<Self, InvalidMessage> {
        if input.is_empty() {
            return Err(InvalidMessage::Empty);
        }

        let normalized = normalize_line_endings(input);

        let (header_block, body) = match normalized.find(b"\r\n\r\n") {
            Some(i) => (&normalized[..i + 2], &normalized[i + 4..]),
            None => (&normalized[..], &[][..]),
        };

        let headers = parse_header_block(header_block)?;

        Ok(Self {
            raw: input.into(),
            headers: headers.into(),
            body: body.into(),
        })
    }

    /// The input bytes, exactly as given.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// The header fields, in order of appearance.
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// The message body, with CRLF line endings.
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl Debug for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("headers", &self.headers)
            .field("body", &self.body.as_bstr())
            .finish()
    }
}

/// Rewrites bare CR and bare LF to CRLF, in a single pass. Existing CRLF
/// pairs are left untouched; the function is idempotent.
pub fn normalize_line_endings(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());

    let mut i = 0;
    while i < input.len() {
        match input[i] {
            b'\r' => {
                out.extend_from_slice(b"\r\n");
                if input.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
            }
            b'\n' => out.extend_from_slice(b"\r\n"),
            b => out.push(b),
        }
        i += 1;
    }

    out
}

// A header field is a non-WSP-prefixed line followed by any number of
// continuation lines beginning with SP or HTAB. The folding CRLF-WSP
// sequences are kept verbatim in the field value.
fn parse_header_block(block: &[u8]) -> Result<Vec<Header>, InvalidMessage> {
    if !block.ends_with(b"\r\n") {
        return Err(InvalidMessage::UnterminatedHeaderBlock);
    }

    let content = &block[..block.len() - 2];
    if content.is_empty() {
        return Ok(vec![]);
    }

    let mut headers = vec![];
    let mut current: Option<(&str, Vec<u8>)> = None;

    for line in content.split_str("\r\n") {
        if line.starts_with(b" ") || line.starts_with(b"\t") {
            match &mut current {
                Some((_, value)) => {
                    value.extend_from_slice(b"\r\n");
                    value.extend_from_slice(line);
                }
                None => return Err(InvalidMessage::LeadingContinuationLine),
            }
            continue;
        }

        if let Some((name, value)) = current.take() {
            headers.push(Header::new(name, value).map_err(|_| InvalidMessage::InvalidHeader)?);
        }

        let colon = line
            .find_byte(b':')
            .ok_or(InvalidMessage::MissingColon)?;
        let name =
            str::from_utf8(&line[..colon]).map_err(|_| InvalidMessage::InvalidHeader)?;
        current = Some((name, line[colon + 1..].to_vec()));
    }

    if let Some((name, value)) = current {
        headers.push(Header::new(name, value).map_err(|_| InvalidMessage::InvalidHeader)?);
    }

    Ok(headers)
}
