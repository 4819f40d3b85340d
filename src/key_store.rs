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

//! Retrieval of public key records from DNS.

use crate::{
    lookup::{DnsError, TxtLookup},
    record::{KeyRecord, KeyRecordError},
};
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    str,
};
use tracing::trace;

#[derive(Debug)]
pub enum KeyStoreError {
    /// The s= selector is not valid sub-domain syntax.
    InvalidSelector,
    /// The query returned no TXT records.
    NoRecords,
    /// The query failed.
    Lookup(DnsError),
}

impl Display for KeyStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSelector => write!(f, "invalid selector"),
            Self::NoRecords => write!(f, "no key records found"),
            Self::Lookup(error) => write!(f, "key record lookup failed: {error}"),
        }
    }
}

impl Error for KeyStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Lookup(error) => Some(error),
            _ => None,
        }
    }
}

/// Fetches and parses the DKIM public key records of a (domain, selector)
/// pair.
pub struct KeyStore<'a, T> {
    lookup: &'a T,
}

impl<'a, T: TxtLookup> KeyStore<'a, T> {
    pub fn new(lookup: &'a T) -> Self {
        Self { lookup }
    }

    /// Queries `{selector}._domainkey.{domain}` and parses every TXT record
    /// found there.
    ///
    /// Record-level parse failures are returned in place, so the caller can
    /// diagnose them while trying the remaining records.
    pub fn fetch(
        &self,
        domain: &str,
        selector: &str,
    ) -> Result<Vec<Result<KeyRecord, KeyRecordError>>, KeyStoreError> {
        if !is_valid_selector(selector) {
            return Err(KeyStoreError::InvalidSelector);
        }

        let name = format!("{selector}._domainkey.{domain}");

        trace!(%name, "looking up key records");

        let records = match self.lookup.lookup_txt(&name) {
            Ok(records) if records.is_empty() => return Err(KeyStoreError::NoRecords),
            Ok(records) => records,
            Err(DnsError::NoRecords) => return Err(KeyStoreError::NoRecords),
            Err(e) => return Err(KeyStoreError::Lookup(e)),
        };

        trace!(count = records.len(), "key records found");

        let records = records
            .iter()
            .map(|record| {
                let bytes = record.concatenate();
                let s = str::from_utf8(&bytes).map_err(|_| KeyRecordError::TagListSyntax)?;
                s.parse()
            })
            .collect();

        Ok(records)
    }
}

// Sub-domain syntax from RFC 5321, section 4.1.2: dot-separated labels of
// the form let-dig (ldh-str)*, ie alphanumeric at both ends with hyphens
// allowed in between.
fn is_valid_selector(s: &str) -> bool {
    !s.is_empty() && s.split('.').all(is_ldh_label)
}

fn is_ldh_label(label: &str) -> bool {
    let bytes = label.as_bytes();

    match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) => {
            first.is_ascii_alphanumeric()
                && last.is_ascii_alphanumeric()
                && bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'-')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::TxtRecord;

    struct FixedLookup(Vec<TxtRecord>);

    impl TxtLookup for FixedLookup {
        fn lookup_txt(&self, name: &str) -> Result<Vec<TxtRecord>, DnsError> {
            assert_eq!(name, "sel._domainkey.example.com");
            Ok(self.0.clone())
        }
    }

    #[test]
    fn is_valid_selector_ok() {
        assert!(is_valid_selector("sel"));
        assert!(is_valid_selector("brisbane"));
        assert!(is_valid_selector("20161025"));
        assert!(is_valid_selector("s-el.v2"));
        assert!(is_valid_selector("a"));

        assert!(!is_valid_selector(""));
        assert!(!is_valid_selector("."));
        assert!(!is_valid_selector("sel."));
        assert!(!is_valid_selector(".sel"));
        assert!(!is_valid_selector("-sel"));
        assert!(!is_valid_selector("sel-"));
        assert!(!is_valid_selector("_sel"));
        assert!(!is_valid_selector("se l"));
        assert!(!is_valid_selector("sél"));
    }

    #[test]
    fn fetch_concatenates_fragments() {
        let lookup = FixedLookup(vec![TxtRecord::Fragments(Box::new([
            Box::from(&b"v=DKIM1; "[..]),
            Box::from(&b"p=YWJj"[..]),
        ]))]);

        let records = KeyStore::new(&lookup).fetch("example.com", "sel").unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(&*records[0].as_ref().unwrap().key_data, b"abc");
    }

    #[test]
    fn fetch_keeps_malformed_records_in_place() {
        let lookup = FixedLookup(vec![
            TxtRecord::from("v=DKIM1; rubbish"),
            TxtRecord::from("v=DKIM1; p=YWJj"),
        ]);

        let records = KeyStore::new(&lookup).fetch("example.com", "sel").unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0], Err(KeyRecordError::TagListSyntax));
        assert!(records[1].is_ok());
    }

    #[test]
    fn fetch_invalid_selector() {
        let lookup = FixedLookup(vec![]);

        assert!(matches!(
            KeyStore::new(&lookup).fetch("example.com", "bad selector"),
            Err(KeyStoreError::InvalidSelector),
        ));
    }

    #[test]
    fn fetch_empty_answer_is_no_records() {
        let lookup = FixedLookup(vec![]);

        assert!(matches!(
            KeyStore::new(&lookup).fetch("example.com", "sel"),
            Err(KeyStoreError::NoRecords),
        ));
    }
}
