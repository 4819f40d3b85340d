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

//! A library verifying *DomainKeys Identified Mail* (DKIM) signatures, as
//! described in [RFC 6376].
//!
//! The entry point is [`Verifier`]: given a raw RFC 5322 message, it
//! locates every `DKIM-Signature` header, reconstructs the exact byte
//! sequence the signer committed to, and checks the body hash and the RSA
//! signature. The result is a [`Report`] with one ordered list of
//! diagnostics per signature; [`Report::passes`] condenses it into a
//! yes/no answer.
//!
//! The two external dependencies of the verification process are pluggable
//! capabilities: DNS TXT resolution ([`TxtLookup`]) and cryptography
//! ([`Crypto`], with [`RustCrypto`] as the bundled implementation). The
//! lower-level building blocks — message parsing, canonicalization, tag
//! lists, key records — are exposed in their own modules for users who
//! want to assemble their own pipeline.
//!
//! # Example
//!
//! ```
//! use veridkim::{DnsError, TxtLookup, TxtRecord, Verifier};
//!
//! struct Resolver; // wraps your DNS client
//!
//! impl TxtLookup for Resolver {
//!     fn lookup_txt(&self, _name: &str) -> Result<Vec<TxtRecord>, DnsError> {
//!         Err(DnsError::NoRecords) // consult DNS here
//!     }
//! }
//!
//! let verifier = Verifier::new(Resolver);
//!
//! let report = verifier.verify(b"From: me@example.com\r\n\r\nHi!\r\n")?;
//!
//! assert!(!report.passes());
//! # Ok::<_, veridkim::InvalidMessage>(())
//! ```
//!
//! # Cargo features
//!
//! The feature **`hickory-resolver`** provides a [`TxtLookup`]
//! implementation for the blocking [Hickory DNS] resolver.
//!
//! # Trace logging
//!
//! This library uses the [tracing] crate for internal trace logging. For
//! insight into library operation, install a tracing subscriber and enable
//! logging at `trace` level.
//!
//! [RFC 6376]: https://www.rfc-editor.org/rfc/rfc6376
//! [Hickory DNS]: https://crates.io/crates/hickory-resolver
//! [tracing]: https://crates.io/crates/tracing

pub mod canonicalize;
pub mod crypto;
pub mod header;
pub mod key_store;
pub mod lookup;
pub mod message;
pub mod record;
pub mod signature;
pub mod tag_list;
pub mod verifier;

pub use crate::{
    crypto::{Crypto, CryptoError, HashAlgorithm, RustCrypto},
    header::Header,
    lookup::{DnsError, TxtLookup, TxtRecord},
    message::{InvalidMessage, Message},
    verifier::{Config, Diagnostic, Report, SignatureResult, Status, Verifier},
};
