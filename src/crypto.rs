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

//! Cryptographic capability.
//!
//! The verifier consumes hashing and RSA signature verification through
//! the [`Crypto`] trait; [`RustCrypto`] is the bundled implementation on
//! top of the RustCrypto crates.
//!
//! # DKIM public key formats
//!
//! RFC 6376, section 3.6.1 specifies the p= tag as an RSAPublicKey
//! (RFC 3447), but the example in the RFC appendix installs a
//! SubjectPublicKeyInfo (RFC 5280), and it is the latter that became the
//! de facto standard. [`RustCrypto`] therefore reads keys as
//! SubjectPublicKeyInfo first and falls back to RSAPublicKey.

use base64ct::{Base64, Encoding};
use rsa::{
    pkcs1::DecodeRsaPublicKey, pkcs8::DecodePublicKey, traits::PublicKeyParts, Pkcs1v15Sign,
    RsaPublicKey,
};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    str,
};
use subtle::ConstantTimeEq;

/// A hash algorithm usable in signatures.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
}

impl HashAlgorithm {
    pub fn canonical_str(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
        }
    }
}

impl Display for HashAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_str())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CryptoError {
    InvalidKey,
    InsufficientKeySize,
}

impl Display for CryptoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKey => write!(f, "unusable public key"),
            Self::InsufficientKeySize => write!(f, "public key too small"),
        }
    }
}

impl Error for CryptoError {}

/// The cryptographic primitives consumed by the verifier.
pub trait Crypto {
    /// Digests the data with the given algorithm.
    fn hash(&self, algorithm: HashAlgorithm, data: &[u8]) -> Vec<u8>;

    /// Verifies an RSA signature over `signed`.
    ///
    /// `pem_key` is a PEM-wrapped public key. `Ok(false)` means the key was
    /// usable but the signature does not match; `Err` means the key could
    /// not be used at all.
    fn verify(
        &self,
        algorithm: HashAlgorithm,
        pem_key: &[u8],
        signed: &[u8],
        signature: &[u8],
    ) -> Result<bool, CryptoError>;
}

/// [`Crypto`] implementation backed by the RustCrypto crates.
#[derive(Clone, Copy, Debug, Default)]
pub struct RustCrypto;

impl Crypto for RustCrypto {
    fn hash(&self, algorithm: HashAlgorithm, data: &[u8]) -> Vec<u8> {
        match algorithm {
            HashAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
            HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
        }
    }

    fn verify(
        &self,
        algorithm: HashAlgorithm,
        pem_key: &[u8],
        signed: &[u8],
        signature: &[u8],
    ) -> Result<bool, CryptoError> {
        let public_key = read_rsa_public_key(pem_key)?;

        let digest = self.hash(algorithm, signed);

        let result = match algorithm {
            HashAlgorithm::Sha1 => {
                public_key.verify(Pkcs1v15Sign::new::<Sha1>(), &digest, signature)
            }
            HashAlgorithm::Sha256 => {
                public_key.verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature)
            }
        };

        Ok(result.is_ok())
    }
}

const MIN_KEY_BITS: usize = 1024;

fn read_rsa_public_key(pem_key: &[u8]) -> Result<RsaPublicKey, CryptoError> {
    let pem = str::from_utf8(pem_key).map_err(|_| CryptoError::InvalidKey)?;

    // SubjectPublicKeyInfo first, then the RSAPublicKey format the RFC
    // text specifies.
    let public_key = match RsaPublicKey::from_public_key_pem(pem) {
        Ok(key) => key,
        Err(_) => {
            let der = pem_body(pem).ok_or(CryptoError::InvalidKey)?;
            RsaPublicKey::from_pkcs1_der(&der).map_err(|_| CryptoError::InvalidKey)?
        }
    };

    if public_key.size() * 8 < MIN_KEY_BITS {
        return Err(CryptoError::InsufficientKeySize);
    }

    Ok(public_key)
}

fn pem_body(pem: &str) -> Option<Vec<u8>> {
    let base64: String = pem
        .lines()
        .filter(|line| !line.starts_with("-----"))
        .collect();
    Base64::decode_vec(&base64).ok()
}

/// Wraps SubjectPublicKeyInfo key material into a PEM armor with 64-column
/// base64 lines, as expected by PEM readers.
pub fn wrap_public_key_pem(key_data: &[u8]) -> String {
    let base64 = Base64::encode_string(key_data);

    let mut pem = String::with_capacity(base64.len() + base64.len() / 64 + 64);
    pem.push_str("-----BEGIN PUBLIC KEY-----\n");

    let mut column = 0;
    for c in base64.chars() {
        pem.push(c);
        column += 1;
        if column == 64 {
            pem.push('\n');
            column = 0;
        }
    }
    if column != 0 {
        pem.push('\n');
    }

    pem.push_str("-----END PUBLIC KEY-----\n");
    pem
}

/// Constant-time byte equality, for hash and signature comparisons.
pub fn equals_constant_time(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// Encodes binary data as a base64 string.
pub fn encode_base64<T: AsRef<[u8]>>(input: T) -> String {
    Base64::encode_string(input.as_ref())
}

/// Decodes a base64 string (no embedded whitespace).
pub fn decode_base64(input: &str) -> Result<Vec<u8>, base64ct::Error> {
    Base64::decode_vec(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::{pkcs8::EncodePublicKey, RsaPrivateKey};

    #[test]
    fn hash_crlf_body() {
        // See RFC 6376, section 3.4.3/3.4.4:
        let crypto = RustCrypto;

        assert_eq!(
            encode_base64(crypto.hash(HashAlgorithm::Sha256, b"\r\n")),
            "frcCV1k9oG9oKj3dpUqdJg1PxRT2RSN/XKdLCPjaYaY=",
        );
        assert_eq!(
            encode_base64(crypto.hash(HashAlgorithm::Sha256, b"")),
            "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=",
        );
    }

    #[test]
    fn wrap_public_key_pem_ok() {
        let pem = wrap_public_key_pem(&[0xabu8; 100]);

        let mut lines = pem.lines();
        assert_eq!(lines.next(), Some("-----BEGIN PUBLIC KEY-----"));

        let body: Vec<_> = pem
            .lines()
            .filter(|line| !line.starts_with("-----"))
            .collect();
        assert!(body.iter().all(|line| line.len() <= 64));
        assert_eq!(pem.lines().last(), Some("-----END PUBLIC KEY-----"));

        assert_eq!(pem_body(&pem), Some(vec![0xab; 100]));
    }

    #[test]
    fn equals_constant_time_ok() {
        assert!(equals_constant_time(b"abc", b"abc"));
        assert!(!equals_constant_time(b"abc", b"abd"));
        assert!(!equals_constant_time(b"abc", b"abcd"));
        assert!(equals_constant_time(b"", b""));
    }

    #[test]
    fn verify_roundtrip() {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 1024).unwrap();
        let public_der = private_key
            .to_public_key()
            .to_public_key_der()
            .unwrap();

        let crypto = RustCrypto;
        let pem = wrap_public_key_pem(public_der.as_bytes());

        let signed = b"some canonicalized headers\r\n";
        let digest = crypto.hash(HashAlgorithm::Sha256, signed);
        let signature = private_key
            .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
            .unwrap();

        assert_eq!(
            crypto.verify(HashAlgorithm::Sha256, pem.as_bytes(), signed, &signature),
            Ok(true),
        );
        assert_eq!(
            crypto.verify(HashAlgorithm::Sha256, pem.as_bytes(), b"tampered\r\n", &signature),
            Ok(false),
        );
        assert_eq!(
            crypto.verify(HashAlgorithm::Sha1, pem.as_bytes(), signed, &signature),
            Ok(false),
        );
    }

    #[test]
    fn reject_small_key() {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 512).unwrap();
        let public_der = private_key
            .to_public_key()
            .to_public_key_der()
            .unwrap();

        let pem = wrap_public_key_pem(public_der.as_bytes());

        assert_eq!(
            RustCrypto.verify(HashAlgorithm::Sha256, pem.as_bytes(), b"x", b"y"),
            Err(CryptoError::InsufficientKeySize),
        );
    }

    #[test]
    fn reject_garbage_key() {
        assert_eq!(
            RustCrypto.verify(HashAlgorithm::Sha256, b"not a key", b"x", b"y"),
            Err(CryptoError::InvalidKey),
        );
    }
}
