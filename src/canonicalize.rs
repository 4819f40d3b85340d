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

//! Canonicalization of headers and body.
//!
//! Implements the *simple* and *relaxed* algorithms of RFC 6376,
//! section 3.4, as explicit scans over the bytes. The body functions
//! expect CRLF line endings, which message parsing guarantees.

use crate::{header::Header, signature::CanonicalizationAlgorithm};
use bstr::ByteSlice;

const SP: u8 = b' ';
const CRLF: &[u8] = b"\r\n";

fn is_wsp(b: u8) -> bool {
    matches!(b, b' ' | b'\t')
}

fn is_fws_char(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Writes the canonical form of one header field, without a trailing CRLF.
///
/// In simple mode the name and value are emitted verbatim; in relaxed mode
/// the name is trimmed and lowercased and the value unfolded and
/// compressed.
pub fn canonicalize_header(
    out: &mut Vec<u8>,
    algorithm: CanonicalizationAlgorithm,
    name: &str,
    value: &[u8],
) {
    match algorithm {
        CanonicalizationAlgorithm::Simple => {
            out.extend(name.bytes());
            out.push(b':');
            out.extend_from_slice(value);
        }
        CanonicalizationAlgorithm::Relaxed => {
            let name = name.trim_matches(|c| c == ' ' || c == '\t');
            out.extend(name.to_ascii_lowercase().bytes());
            out.push(b':');
            canonicalize_value_relaxed(out, value);
        }
    }
}

// Unfolds and compresses a header value: every run of WSP and CRLF becomes
// a single SP, leading and trailing whitespace is dropped. Treating CR and
// LF as collapsible whitespace performs the unfolding, since in a folded
// value CRLF only ever occurs followed by WSP.
fn canonicalize_value_relaxed(out: &mut Vec<u8>, value: &[u8]) {
    let value = value.trim_with(is_fws_char);

    let mut pending_space = false;
    for &b in value {
        if is_wsp(b) || b == b'\r' || b == b'\n' {
            pending_space = true;
        } else {
            if pending_space {
                out.push(SP);
                pending_space = false;
            }
            out.push(b);
        }
    }
}

/// Canonicalizes the header fields selected by the h= tag, in h= order,
/// each terminated by CRLF.
///
/// Per RFC 6376, section 5.4.2, every occurrence of a name consumes the
/// next-earlier unconsumed instance of that header in the message;
/// occurrences without a remaining instance are skipped without error.
pub fn canonicalize_signed_headers<S: AsRef<str>>(
    algorithm: CanonicalizationAlgorithm,
    headers: &[Header],
    signed_names: &[S],
) -> Vec<u8> {
    let mut out = vec![];
    let mut consumed = vec![false; headers.len()];

    for name in signed_names {
        let name = name.as_ref();

        for (i, header) in headers.iter().enumerate().rev() {
            if !consumed[i] && header.is_named(name) {
                canonicalize_header(&mut out, algorithm, header.raw_name(), header.raw_value());
                out.extend_from_slice(CRLF);
                consumed[i] = true;
                break;
            }
        }
    }

    out
}

/// Canonical form of a message body.
///
/// An empty body canonicalizes to a single CRLF under both algorithms.
pub fn canonicalize_body(algorithm: CanonicalizationAlgorithm, body: &[u8]) -> Vec<u8> {
    match algorithm {
        CanonicalizationAlgorithm::Simple => canonicalize_body_simple(body),
        CanonicalizationAlgorithm::Relaxed => canonicalize_body_relaxed(body),
    }
}

// Stripping every trailing CRLF and appending exactly one is equivalent to
// removing trailing empty lines and ensuring the final line terminator.
fn canonicalize_body_simple(body: &[u8]) -> Vec<u8> {
    let mut out = strip_trailing_crlf(body).to_vec();
    out.extend_from_slice(CRLF);
    out
}

fn canonicalize_body_relaxed(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len());

    let mut first = true;
    for line in body.split_str("\r\n") {
        if !first {
            out.extend_from_slice(CRLF);
        }
        first = false;

        let line = line.trim_end_with(|c| c == ' ' || c == '\t');

        let mut pending_space = false;
        for &b in line {
            if is_wsp(b) {
                pending_space = true;
            } else {
                if pending_space {
                    out.push(SP);
                    pending_space = false;
                }
                out.push(b);
            }
        }
    }

    let end = strip_trailing_crlf(&out).len();
    out.truncate(end);
    out.extend_from_slice(CRLF);
    out
}

fn strip_trailing_crlf(bytes: &[u8]) -> &[u8] {
    let mut end = bytes.len();
    while bytes[..end].ends_with(CRLF) {
        end -= 2;
    }
    &bytes[..end]
}

/// Applies the l= body length limit to an already canonicalized body.
/// Returns `None` when the limit exceeds the canonical body length.
pub fn apply_body_length(canonical_body: &[u8], length: u64) -> Option<&[u8]> {
    let length = usize::try_from(length).ok()?;
    canonical_body.get(..length)
}

/// Removes the value of the b= tag from a `DKIM-Signature` header value.
///
/// The tag name, the equals sign and the delimiting `;` (or end of value)
/// are preserved, as is every byte outside the stripped tag value, so the
/// result parses to the same tag list with `b` mapped to the empty string.
pub fn strip_signature_data(value: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    let mut rest = value;

    loop {
        let (segment, more) = match rest.find_byte(b';') {
            Some(i) => (&rest[..i], Some(&rest[i + 1..])),
            None => (rest, None),
        };

        match b_tag_prefix_len(segment) {
            Some(n) => out.extend_from_slice(&segment[..n]),
            None => out.extend_from_slice(segment),
        }

        match more {
            Some(r) => {
                out.push(b';');
                rest = r;
            }
            None => break,
        }
    }

    out
}

// Length of a `b` tag-name prefix through its `=`, or `None` when the
// segment is not a b= tag. The tag name is case-sensitive, so bh= and B=
// are left alone.
fn b_tag_prefix_len(segment: &[u8]) -> Option<usize> {
    let mut i = 0;

    while segment.get(i).is_some_and(|&b| is_wsp(b) || b == b'\r' || b == b'\n') {
        i += 1;
    }
    if segment.get(i) != Some(&b'b') {
        return None;
    }
    i += 1;
    while segment.get(i).is_some_and(|&b| is_wsp(b) || b == b'\r' || b == b'\n') {
        i += 1;
    }
    if segment.get(i) != Some(&b'=') {
        return None;
    }

    Some(i + 1)
}
