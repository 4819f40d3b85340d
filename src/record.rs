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

//! DKIM public key records.
//!
//! See RFC 6376, section 3.6.1.

use crate::tag_list::{TagList, TagListSyntax};
use base64ct::{Base64, Encoding};
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    str::FromStr,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KeyRecordError {
    TagListSyntax,
    InvalidKeyData,
}

impl Display for KeyRecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::TagListSyntax => write!(f, "malformed tag list in key record"),
            Self::InvalidKeyData => write!(f, "invalid base64 in p= tag"),
        }
    }
}

impl Error for KeyRecordError {}

/// A public key record fetched from DNS.
///
/// Parsing is deliberately lenient: whether the record is compatible with
/// a given signature (version, key type, allowed hash algorithms, service
/// types) is the verifier’s per-key concern, reported as a PERMFAIL for
/// that key rather than failing the parse. Only the tag-list syntax itself
/// and the p= base64 can make a record unusable.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyRecord {
    /// The raw v= value, when present. Must be `DKIM1` to be usable.
    pub version: Option<Box<str>>,
    /// Hash algorithm names from the h= tag; `None` means unrestricted.
    pub hash_algorithms: Option<Box<[Box<str>]>>,
    /// The k= key type; defaults to `rsa`.
    pub key_type: Box<str>,
    /// Decoded p= key material; empty means the key is revoked.
    pub key_data: Box<[u8]>,
    /// Service type names from the s= tag; defaults to `*`.
    pub service_types: Box<[Box<str>]>,
    /// Flag names from the t= tag.
    pub flags: Box<[Box<str>]>,
    /// Tag names that occurred more than once, for diagnostics.
    pub duplicate_tags: Box<[Box<str>]>,
}

impl FromStr for KeyRecord {
    type Err = KeyRecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tags = TagList::parse(s).map_err(|TagListSyntax| KeyRecordError::TagListSyntax)?;

        let mut version = None;
        let mut hash_algorithms = None;
        let mut key_type: Box<str> = "rsa".into();
        let mut key_data: Box<[u8]> = Box::default();
        let mut service_types: Box<[Box<str>]> = Box::new(["*".into()]);
        let mut flags: Box<[Box<str>]> = Box::default();

        // later assignments overwrite earlier ones, so duplicates resolve
        // to the last occurrence
        for tag in tags.tags() {
            let value = &*tag.value;
            match &*tag.name {
                "v" => version = Some(value.into()),
                "h" => hash_algorithms = Some(split_colon_list(value)),
                "k" => key_type = value.into(),
                "p" => {
                    key_data = Base64::decode_vec(value)
                        .map_err(|_| KeyRecordError::InvalidKeyData)?
                        .into();
                }
                "s" => service_types = split_colon_list(value),
                "t" => flags = split_colon_list(value),
                _ => {}
            }
        }

        let duplicate_tags = tags
            .duplicate_names()
            .iter()
            .map(|&name| name.into())
            .collect();

        Ok(Self {
            version,
            hash_algorithms,
            key_type,
            key_data,
            service_types,
            flags,
            duplicate_tags,
        })
    }
}

impl KeyRecord {
    /// A key with empty p= data has been revoked by the signer.
    pub fn is_revoked(&self) -> bool {
        self.key_data.is_empty()
    }

    pub fn allows_hash_algorithm(&self, name: &str) -> bool {
        match &self.hash_algorithms {
            Some(names) => names.iter().any(|n| n.eq_ignore_ascii_case(name)),
            None => true,
        }
    }

    pub fn allows_email_service(&self) -> bool {
        self.service_types
            .iter()
            .any(|s| &**s == "*" || s.eq_ignore_ascii_case("email"))
    }

    /// Whether the y flag is set: the domain is merely testing DKIM.
    pub fn is_testing(&self) -> bool {
        self.flags.iter().any(|f| f.eq_ignore_ascii_case("y"))
    }
}

fn split_colon_list(value: &str) -> Box<[Box<str>]> {
    value
        .split(':')
        .filter(|s| !s.is_empty())
        .map(Into::into)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_with_defaults() {
        let record: KeyRecord = "v=DKIM1; p=YWJj".parse().unwrap();

        assert_eq!(record.version.as_deref(), Some("DKIM1"));
        assert_eq!(record.hash_algorithms, None);
        assert_eq!(&*record.key_type, "rsa");
        assert_eq!(&*record.key_data, b"abc");
        assert_eq!(&*record.service_types, [Box::from("*")]);
        assert!(record.flags.is_empty());
        assert!(!record.is_revoked());
        assert!(record.allows_hash_algorithm("sha256"));
        assert!(record.allows_hash_algorithm("sha1"));
        assert!(record.allows_email_service());
        assert!(!record.is_testing());
    }

    #[test]
    fn parse_restricted_record() {
        let record: KeyRecord =
            "v=DKIM1; h=sha256; k=rsa; s=email; t=y:s; p=YWJj".parse().unwrap();

        assert!(record.allows_hash_algorithm("sha256"));
        assert!(!record.allows_hash_algorithm("sha1"));
        assert!(record.allows_email_service());
        assert!(record.is_testing());
    }

    #[test]
    fn parse_revoked_key() {
        let record: KeyRecord = "v=DKIM1; p=".parse().unwrap();

        assert!(record.is_revoked());
    }

    #[test]
    fn parse_disallowed_service() {
        let record: KeyRecord = "v=DKIM1; s=web; p=YWJj".parse().unwrap();

        assert!(!record.allows_email_service());
    }

    #[test]
    fn parse_duplicate_tags_last_wins() {
        let record: KeyRecord = "v=DKIM1; k=ed25519; k=rsa; p=YWJj".parse().unwrap();

        assert_eq!(&*record.key_type, "rsa");
        assert_eq!(&*record.duplicate_tags, [Box::from("k")]);
    }

    #[test]
    fn parse_errors() {
        assert_eq!(
            "v=DKIM1; rubbish".parse::<KeyRecord>(),
            Err(KeyRecordError::TagListSyntax),
        );
        assert_eq!(
            "v=DKIM1; p=!notbase64!".parse::<KeyRecord>(),
            Err(KeyRecordError::InvalidKeyData),
        );
    }
}
