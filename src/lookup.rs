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

//! DNS TXT lookup capability.
//!
//! The verifier performs key record lookups through the [`TxtLookup`]
//! trait. The call may block; cancellation and timeouts are the
//! implementation’s concern. With the **`hickory-resolver`** feature an
//! implementation for the blocking [Hickory DNS] resolver is provided.
//!
//! [Hickory DNS]: https://crates.io/crates/hickory-resolver

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    io,
};

/// A single DNS TXT record.
///
/// TXT records are transmitted as one or more character-string fragments
/// of at most 255 bytes each; a record is the in-order concatenation of
/// its fragments, without separator.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TxtRecord {
    Single(Box<[u8]>),
    Fragments(Box<[Box<[u8]>]>),
}

impl TxtRecord {
    /// Concatenates the record’s fragments.
    pub fn concatenate(&self) -> Vec<u8> {
        match self {
            Self::Single(data) => data.to_vec(),
            Self::Fragments(fragments) => fragments.concat(),
        }
    }
}

impl From<&str> for TxtRecord {
    fn from(s: &str) -> Self {
        Self::Single(s.as_bytes().into())
    }
}

impl From<String> for TxtRecord {
    fn from(s: String) -> Self {
        Self::Single(s.into_bytes().into())
    }
}

impl From<Vec<u8>> for TxtRecord {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Single(bytes.into())
    }
}

#[derive(Debug)]
pub enum DnsError {
    /// The name exists but has no TXT records, or does not exist.
    NoRecords,
    /// The nameserver answered with a failure (eg SERVFAIL).
    ServerFailure,
    /// Transport-level failure.
    Io(io::Error),
}

impl Display for DnsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRecords => write!(f, "no TXT records found"),
            Self::ServerFailure => write!(f, "DNS server failure"),
            Self::Io(error) => write!(f, "DNS I/O error: {error}"),
        }
    }
}

impl Error for DnsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(error) => Some(error),
            _ => None,
        }
    }
}

/// DNS TXT lookup.
pub trait TxtLookup {
    /// Looks up the TXT records published at `name`.
    fn lookup_txt(&self, name: &str) -> Result<Vec<TxtRecord>, DnsError>;
}

impl<T: TxtLookup + ?Sized> TxtLookup for &T {
    fn lookup_txt(&self, name: &str) -> Result<Vec<TxtRecord>, DnsError> {
        (**self).lookup_txt(name)
    }
}

#[cfg(feature = "hickory-resolver")]
mod hickory {
    use super::{DnsError, TxtLookup, TxtRecord};
    use hickory_resolver::error::ResolveErrorKind;
    use std::io;

    impl TxtLookup for hickory_resolver::Resolver {
        fn lookup_txt(&self, name: &str) -> Result<Vec<TxtRecord>, DnsError> {
            let lookup = self.txt_lookup(name).map_err(|e| match e.kind() {
                ResolveErrorKind::NoRecordsFound { .. } => DnsError::NoRecords,
                ResolveErrorKind::Io(_) => {
                    DnsError::Io(io::Error::new(io::ErrorKind::Other, e.to_string()))
                }
                _ => DnsError::ServerFailure,
            })?;

            Ok(lookup
                .iter()
                .map(|txt| TxtRecord::Fragments(txt.txt_data().to_vec().into()))
                .collect())
        }
    }
}
