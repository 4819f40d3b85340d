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

//! DKIM signature representation.

use crate::crypto::{self, HashAlgorithm};
use std::{
    fmt::{self, Debug, Display, Formatter},
    str::FromStr,
};

pub const DKIM_SIGNATURE_NAME: &str = "DKIM-Signature";

/// A signature algorithm, the value of the a= tag.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SignatureAlgorithm {
    /// The *rsa-sha256* signature algorithm.
    RsaSha256,
    /// The historic *rsa-sha1* signature algorithm (RFC 8301 relegates it;
    /// verification flags it as weak but still proceeds).
    RsaSha1,
}

impl SignatureAlgorithm {
    /// Returns this signature algorithm’s hash algorithm.
    pub fn hash_algorithm(self) -> HashAlgorithm {
        match self {
            Self::RsaSha256 => HashAlgorithm::Sha256,
            Self::RsaSha1 => HashAlgorithm::Sha1,
        }
    }

    /// Returns this signature algorithm’s key type, as named in the k= tag
    /// of key records.
    pub fn key_type(self) -> &'static str {
        "rsa"
    }

    pub fn canonical_str(self) -> &'static str {
        match self {
            Self::RsaSha256 => "rsa-sha256",
            Self::RsaSha1 => "rsa-sha1",
        }
    }
}

impl Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_str())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("rsa-sha256") {
            Ok(Self::RsaSha256)
        } else if s.eq_ignore_ascii_case("rsa-sha1") {
            Ok(Self::RsaSha1)
        } else {
            Err("unsupported signature algorithm")
        }
    }
}

/// A canonicalization algorithm.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum CanonicalizationAlgorithm {
    /// The *simple* canonicalization algorithm.
    #[default]
    Simple,
    /// The *relaxed* canonicalization algorithm.
    Relaxed,
}

impl CanonicalizationAlgorithm {
    pub fn canonical_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Relaxed => "relaxed",
        }
    }
}

impl Display for CanonicalizationAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_str())
    }
}

impl FromStr for CanonicalizationAlgorithm {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("simple") {
            Ok(Self::Simple)
        } else if s.eq_ignore_ascii_case("relaxed") {
            Ok(Self::Relaxed)
        } else {
            Err("unknown canonicalization algorithm")
        }
    }
}

/// The header/body canonicalization pair of the c= tag.
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
pub struct Canonicalization {
    pub header: CanonicalizationAlgorithm,
    pub body: CanonicalizationAlgorithm,
}

impl Display for Canonicalization {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.header, self.body)
    }
}

impl Debug for Canonicalization {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{:?}", &self.header, &self.body)
    }
}

impl FromStr for Canonicalization {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // A value without "/" names only the header algorithm; the body
        // algorithm then defaults to simple (RFC 6376, section 3.5).
        Ok(match s.split_once('/') {
            Some((header, body)) => Self {
                header: header.parse()?,
                body: body.parse()?,
            },
            None => Self {
                header: s.parse()?,
                body: Default::default(),
            },
        })
    }
}

/// The validated tag set of one `DKIM-Signature` header.
#[derive(Clone, Eq, PartialEq)]
pub struct DkimSignature {
    pub algorithm: SignatureAlgorithm,
    pub signature_data: Box<[u8]>,
    pub body_hash: Box<[u8]>,
    pub canonicalization: Canonicalization,
    pub domain: Box<str>,
    pub selector: Box<str>,
    pub signed_headers: Box<[Box<str>]>,
    pub identity: Option<Box<str>>,
    pub body_length: Option<u64>,
    pub timestamp: Option<u64>,
    pub expiration: Option<u64>,
}

impl Debug for DkimSignature {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DkimSignature")
            .field("algorithm", &self.algorithm)
            .field("signature_data", &crypto::encode_base64(&self.signature_data))
            .field("body_hash", &crypto::encode_base64(&self.body_hash))
            .field("canonicalization", &self.canonicalization)
            .field("domain", &self.domain)
            .field("selector", &self.selector)
            .field("signed_headers", &self.signed_headers)
            .field("identity", &self.identity)
            .field("body_length", &self.body_length)
            .field("timestamp", &self.timestamp)
            .field("expiration", &self.expiration)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_algorithm_from_str() {
        assert_eq!("rsa-sha256".parse(), Ok(SignatureAlgorithm::RsaSha256));
        assert_eq!("RSA-SHA256".parse(), Ok(SignatureAlgorithm::RsaSha256));
        assert_eq!("rsa-sha1".parse(), Ok(SignatureAlgorithm::RsaSha1));

        assert!("ed25519-sha256".parse::<SignatureAlgorithm>().is_err());
        assert!("rsa-md5".parse::<SignatureAlgorithm>().is_err());
    }

    #[test]
    fn canonicalization_from_str() {
        let c: Canonicalization = "relaxed/simple".parse().unwrap();
        assert_eq!(c.header, CanonicalizationAlgorithm::Relaxed);
        assert_eq!(c.body, CanonicalizationAlgorithm::Simple);

        // without "/" the body algorithm defaults to simple
        let c: Canonicalization = "relaxed".parse().unwrap();
        assert_eq!(c.header, CanonicalizationAlgorithm::Relaxed);
        assert_eq!(c.body, CanonicalizationAlgorithm::Simple);

        let c: Canonicalization = "simple".parse().unwrap();
        assert_eq!(c, Canonicalization::default());

        assert!("strict/simple".parse::<Canonicalization>().is_err());
        assert!("simple/loose".parse::<Canonicalization>().is_err());
        assert!("".parse::<Canonicalization>().is_err());
    }
}
