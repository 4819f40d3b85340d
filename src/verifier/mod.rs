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

//! Verifier and result report.
//!
//! [`Verifier::verify`] locates every `DKIM-Signature` header of a raw
//! message and validates each one independently, accumulating an ordered
//! list of [`Diagnostic`] records per signature. Failure of one signature
//! never aborts processing of the others.

use crate::{
    canonicalize,
    crypto::{self, Crypto, RustCrypto},
    header::Header,
    key_store::{KeyStore, KeyStoreError},
    lookup::TxtLookup,
    message::{InvalidMessage, Message},
    record::KeyRecord,
    signature::{Canonicalization, DkimSignature, SignatureAlgorithm, DKIM_SIGNATURE_NAME},
    tag_list::TagList,
};
use std::{
    fmt::{self, Display, Formatter},
    str,
    time::{SystemTime, UNIX_EPOCH},
};
use tracing::trace;

/// Verifier configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Cap on the number of `DKIM-Signature` headers examined per message.
    pub max_signatures: usize,

    /// Fixed verification time, as seconds since the Unix epoch, used for
    /// the x= expiry check. `None` means the system clock.
    pub current_time: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_signatures: 20,
            current_time: None,
        }
    }
}

impl Config {
    fn current_timestamp(&self) -> u64 {
        self.current_time.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|t| t.as_secs())
                .unwrap_or_default()
        })
    }
}

/// Severity of a diagnostic record, per RFC 6376, section 3.9.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    /// Informational success or progress marker.
    Info,
    /// Permanent, non-retryable failure.
    Permfail,
    /// Transient failure; verification could be retried later.
    Tempfail,
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Permfail => write!(f, "PERMFAIL"),
            Self::Tempfail => write!(f, "TEMPFAIL"),
        }
    }
}

/// One diagnostic record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Diagnostic {
    pub status: Status,
    pub reason: String,
}

impl Diagnostic {
    fn info(reason: impl Into<String>) -> Self {
        Self {
            status: Status::Info,
            reason: reason.into(),
        }
    }

    fn permfail(reason: impl Into<String>) -> Self {
        Self {
            status: Status::Permfail,
            reason: reason.into(),
        }
    }

    fn tempfail(reason: impl Into<String>) -> Self {
        Self {
            status: Status::Tempfail,
            reason: reason.into(),
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.reason)
    }
}

/// The outcome for a single `DKIM-Signature` header.
#[derive(Clone, Debug, PartialEq)]
pub struct SignatureResult {
    /// Index of the `DKIM-Signature` header among the message’s headers.
    pub header_index: usize,

    /// The parsed signature, when tag extraction got far enough.
    pub signature: Option<DkimSignature>,

    /// The accumulated diagnostics, in order of evaluation.
    pub diagnostics: Vec<Diagnostic>,

    /// Whether the cryptographic verification succeeded.
    pub verified: bool,
}

impl SignatureResult {
    pub fn has_failure(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d.status, Status::Permfail | Status::Tempfail))
    }
}

/// The verification report: one entry per `DKIM-Signature` header, in
/// order of appearance.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Report {
    pub signatures: Vec<SignatureResult>,
}

impl Report {
    /// Whether the message passes DKIM: exactly one signature is present,
    /// it verified, and no PERMFAIL or TEMPFAIL was recorded for it.
    pub fn passes(&self) -> bool {
        match self.signatures.as_slice() {
            [signature] => signature.verified && !signature.has_failure(),
            _ => false,
        }
    }
}

/// A verifier validating all DKIM signatures in a message.
///
/// DNS and cryptography are consumed through the [`TxtLookup`] and
/// [`Crypto`] capabilities; the verifier itself holds no state across
/// [`verify`][Verifier::verify] calls.
pub struct Verifier<T, C = RustCrypto> {
    lookup: T,
    crypto: C,
    config: Config,
}

impl<T: TxtLookup> Verifier<T> {
    pub fn new(lookup: T) -> Self {
        Self::with_crypto(lookup, RustCrypto)
    }
}

impl<T: TxtLookup, C: Crypto> Verifier<T, C> {
    pub fn with_crypto(lookup: T, crypto: C) -> Self {
        Self {
            lookup,
            crypto,
            config: Config::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Verifies every `DKIM-Signature` header of the raw message.
    ///
    /// Only an unparseable message is an error; everything else is
    /// reported per signature in the returned [`Report`].
    pub fn verify(&self, raw_message: &[u8]) -> Result<Report, InvalidMessage> {
        let message = Message::parse(raw_message)?;

        let mut signatures = vec![];

        let dkim_headers = message
            .headers()
            .iter()
            .enumerate()
            .filter(|(_, header)| header.is_named(DKIM_SIGNATURE_NAME))
            .take(self.config.max_signatures);

        for (header_index, header) in dkim_headers {
            trace!(header_index, "processing DKIM-Signature header");
            signatures.push(self.verify_signature(&message, header_index, header));
        }

        Ok(Report { signatures })
    }

    fn verify_signature(
        &self,
        message: &Message,
        header_index: usize,
        header: &Header,
    ) -> SignatureResult {
        let mut result = SignatureResult {
            header_index,
            signature: None,
            diagnostics: vec![],
            verified: false,
        };
        let diagnostics = &mut result.diagnostics;

        let now = self.config.current_timestamp();

        let Some(sig) = extract_signature(header, now, diagnostics) else {
            return result;
        };

        // Body length check: the l= tag covers a prefix of the canonical
        // body and must not exceed it.
        let canonical_body =
            canonicalize::canonicalize_body(sig.canonicalization.body, message.body());

        let covered_body = match sig.body_length {
            Some(length) => match canonicalize::apply_body_length(&canonical_body, length) {
                Some(prefix) => prefix,
                None => {
                    diagnostics.push(Diagnostic::permfail(
                        "l= tag exceeds canonical body length",
                    ));
                    &canonical_body[..]
                }
            },
            None => &canonical_body[..],
        };

        // Cryptographic steps depend on the preconditions above; skip them
        // once a permanent failure is on record.
        if diagnostics.iter().any(|d| d.status == Status::Permfail) {
            trace!("skipping cryptographic checks after permanent failure");
            result.signature = Some(sig);
            return result;
        }

        let records = match KeyStore::new(&self.lookup).fetch(&sig.domain, &sig.selector) {
            Ok(records) => records,
            Err(e @ KeyStoreError::InvalidSelector) => {
                diagnostics.push(Diagnostic::permfail(e.to_string()));
                result.signature = Some(sig);
                return result;
            }
            Err(e @ (KeyStoreError::NoRecords | KeyStoreError::Lookup(_))) => {
                diagnostics.push(Diagnostic::tempfail(e.to_string()));
                result.signature = Some(sig);
                return result;
            }
        };

        let hash_algorithm = sig.algorithm.hash_algorithm();

        let body_hash = self.crypto.hash(hash_algorithm, covered_body);

        if !crypto::equals_constant_time(&body_hash, &sig.body_hash) {
            trace!(
                computed = %crypto::encode_base64(&body_hash),
                "body hash mismatch",
            );
            diagnostics.push(Diagnostic::permfail("body hash mismatch"));
            result.signature = Some(sig);
            return result;
        }

        diagnostics.push(Diagnostic::info("body hash verified"));

        let signed_data = assemble_signed_data(message, header, &sig);

        // Step through all fetched key records; any one of them verifying
        // the signature is a success. Per-key failures are reported with
        // the key’s own index and do not short-circuit the remaining keys.
        // Failed verification attempts surface only when no key succeeds.
        let mut failed_attempts = vec![];

        for (key_index, record) in records.iter().enumerate() {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    trace!(key_index, "unusable key record");
                    diagnostics.push(Diagnostic::tempfail(format!("key record {key_index}: {e}")));
                    continue;
                }
            };

            for name in record.duplicate_tags.iter() {
                diagnostics.push(Diagnostic::info(format!(
                    "key record {key_index}: duplicate {name}= tag, last value used",
                )));
            }

            if record.is_testing() {
                diagnostics.push(Diagnostic::info(format!(
                    "key record {key_index}: domain is testing DKIM",
                )));
            }

            if let Err(reason) = check_key_record(record, &sig) {
                trace!(key_index, reason, "key record not usable for this signature");
                diagnostics.push(Diagnostic::permfail(format!(
                    "key record {key_index}: {reason}",
                )));
                continue;
            }

            let pem_key = crypto::wrap_public_key_pem(&record.key_data);

            match self.crypto.verify(
                hash_algorithm,
                pem_key.as_bytes(),
                &signed_data,
                &sig.signature_data,
            ) {
                Ok(true) => {
                    trace!(key_index, "signature verified");
                    diagnostics.push(Diagnostic::info("signature verified"));
                    result.verified = true;
                    break;
                }
                Ok(false) => {
                    trace!(key_index, "signature does not verify");
                    failed_attempts.push(Diagnostic::permfail(format!(
                        "key record {key_index}: signature verification failed",
                    )));
                }
                Err(e) => {
                    trace!(key_index, "unusable public key");
                    failed_attempts.push(Diagnostic::permfail(format!(
                        "key record {key_index}: {e}",
                    )));
                }
            }
        }

        if !result.verified {
            diagnostics.append(&mut failed_attempts);
        }

        result.signature = Some(sig);
        result
    }
}

const REQUIRED_TAGS: [&str; 7] = ["v", "a", "b", "bh", "d", "h", "s"];

// Tag extraction and the precondition checks that need no DNS or
// cryptography. Diagnostics accumulate; `None` means no usable tag set
// could be assembled.
fn extract_signature(
    header: &Header,
    now: u64,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<DkimSignature> {
    let value = match str::from_utf8(header.raw_value()) {
        Ok(value) => value,
        Err(_) => {
            diagnostics.push(Diagnostic::permfail("invalid UTF-8 in DKIM-Signature header"));
            return None;
        }
    };

    let tags = match TagList::parse(value) {
        Ok(tags) => tags,
        Err(e) => {
            diagnostics.push(Diagnostic::permfail(e.to_string()));
            return None;
        }
    };

    for name in tags.duplicate_names() {
        diagnostics.push(Diagnostic::info(format!(
            "duplicate {name}= tag, last value used",
        )));
    }

    for name in REQUIRED_TAGS {
        match tags.get(name) {
            Some(_) => diagnostics.push(Diagnostic::info(format!("{name}= tag present"))),
            None => diagnostics.push(Diagnostic::permfail(format!("{name}= tag missing"))),
        }
    }

    if let Some(v) = tags.get("v") {
        if v == "1" {
            diagnostics.push(Diagnostic::info("version 1"));
        } else {
            diagnostics.push(Diagnostic::permfail(format!("unsupported version {v}")));
        }
    }

    let mut algorithm = None;
    if let Some(a) = tags.get("a") {
        match a.parse::<SignatureAlgorithm>() {
            Ok(alg) => {
                if alg == SignatureAlgorithm::RsaSha1 {
                    diagnostics.push(Diagnostic::info("weak hash algorithm sha1"));
                }
                algorithm = Some(alg);
            }
            Err(_) => {
                diagnostics.push(Diagnostic::permfail(format!(
                    "unsupported signature algorithm {a}",
                )));
            }
        }
    }

    let mut signature_data = None;
    if let Some(b) = tags.get("b") {
        match crypto::decode_base64(b) {
            Ok(data) => signature_data = Some(data),
            Err(_) => diagnostics.push(Diagnostic::permfail("invalid base64 in b= tag")),
        }
    }

    let mut body_hash = None;
    if let Some(bh) = tags.get("bh") {
        match crypto::decode_base64(bh) {
            Ok(data) => body_hash = Some(data),
            Err(_) => diagnostics.push(Diagnostic::permfail("invalid base64 in bh= tag")),
        }
    }

    let mut canonicalization = None;
    match tags.get("c") {
        Some(c) => match c.parse::<Canonicalization>() {
            Ok(value) => canonicalization = Some(value),
            Err(_) => {
                diagnostics.push(Diagnostic::permfail(format!(
                    "unsupported canonicalization {c}",
                )));
            }
        },
        // the default is simple/simple (RFC 6376, section 3.5)
        None => canonicalization = Some(Canonicalization::default()),
    }

    let mut domain = None;
    if let Some(d) = tags.get("d") {
        if d.is_empty() {
            diagnostics.push(Diagnostic::permfail("empty d= tag"));
        } else {
            domain = Some(d);
        }
    }

    let mut selector = None;
    if let Some(s) = tags.get("s") {
        if s.is_empty() {
            diagnostics.push(Diagnostic::permfail("empty s= tag"));
        } else {
            selector = Some(s);
        }
    }

    let mut signed_headers = None;
    if let Some(h) = tags.get("h") {
        let names: Vec<Box<str>> = h
            .split(':')
            .filter(|name| !name.is_empty())
            .map(Into::into)
            .collect();

        if !names.iter().any(|name| name.eq_ignore_ascii_case("from")) {
            diagnostics.push(Diagnostic::permfail("From header not included in h= tag"));
        }

        signed_headers = Some(names);
    }

    let mut identity = None;
    if let Some(i) = tags.get("i") {
        if let Some(d) = domain {
            if i.to_ascii_lowercase().ends_with(&d.to_ascii_lowercase()) {
                identity = Some(i);
            } else {
                diagnostics.push(Diagnostic::permfail(
                    "i= identity does not end in d= domain",
                ));
            }
        }
    }

    let mut body_length = None;
    if let Some(l) = tags.get("l") {
        match l.parse::<u64>() {
            Ok(length) => body_length = Some(length),
            Err(_) => diagnostics.push(Diagnostic::permfail("invalid l= tag")),
        }
    }

    let mut timestamp = None;
    if let Some(t) = tags.get("t") {
        match t.parse::<u64>() {
            Ok(value) => timestamp = Some(value),
            Err(_) => diagnostics.push(Diagnostic::permfail("invalid t= tag")),
        }
    }

    let mut expiration = None;
    if let Some(x) = tags.get("x") {
        match x.parse::<u64>() {
            Ok(value) => expiration = Some(value),
            Err(_) => diagnostics.push(Diagnostic::permfail("invalid x= tag")),
        }
    }

    if let Some(x) = expiration {
        if x < now {
            diagnostics.push(Diagnostic::permfail("signature expired"));
        }
        if let Some(t) = timestamp {
            if x < t {
                diagnostics.push(Diagnostic::permfail("x= expiration before t= timestamp"));
            }
        }
    }

    if let Some(q) = tags.get("q") {
        // absent or empty q= defaults to dns/txt, the only supported method
        if !q.is_empty() && !q.split(':').any(|method| method.eq_ignore_ascii_case("dns/txt")) {
            diagnostics.push(Diagnostic::permfail(format!(
                "query method {q} not supported",
            )));
        }
    }

    let (
        Some(algorithm),
        Some(signature_data),
        Some(body_hash),
        Some(canonicalization),
        Some(domain),
        Some(selector),
        Some(signed_headers),
    ) = (
        algorithm,
        signature_data,
        body_hash,
        canonicalization,
        domain,
        selector,
        signed_headers,
    )
    else {
        return None;
    };

    Some(DkimSignature {
        algorithm,
        signature_data: signature_data.into(),
        body_hash: body_hash.into(),
        canonicalization,
        domain: domain.into(),
        selector: selector.into(),
        signed_headers: signed_headers.into(),
        identity: identity.map(Into::into),
        body_length,
        timestamp,
        expiration,
    })
}

// RFC 6376, section 3.7: the canonical signed headers, followed by the
// DKIM-Signature header being verified with its b= value removed and
// without a trailing CRLF.
fn assemble_signed_data(message: &Message, dkim_header: &Header, sig: &DkimSignature) -> Vec<u8> {
    let mut data = canonicalize::canonicalize_signed_headers(
        sig.canonicalization.header,
        message.headers(),
        &sig.signed_headers,
    );

    // a fresh value; the message's own header stays untouched
    let stripped_value = canonicalize::strip_signature_data(dkim_header.raw_value());

    canonicalize::canonicalize_header(
        &mut data,
        sig.canonicalization.header,
        dkim_header.raw_name(),
        &stripped_value,
    );

    data
}

fn check_key_record(record: &KeyRecord, sig: &DkimSignature) -> Result<(), &'static str> {
    if let Some(version) = &record.version {
        if &**version != "DKIM1" {
            return Err("unsupported key record version");
        }
    }

    if !record.key_type.eq_ignore_ascii_case(sig.algorithm.key_type()) {
        return Err("wrong key type");
    }

    if !record.allows_hash_algorithm(sig.algorithm.hash_algorithm().canonical_str()) {
        return Err("hash algorithm not allowed by key record");
    }

    if !record.allows_email_service() {
        return Err("service type not allowed by key record");
    }

    if record.is_revoked() {
        return Err("revoked key");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::{DnsError, TxtRecord};

    struct MockLookup(Box<dyn Fn(&str) -> Result<Vec<TxtRecord>, DnsError>>);

    impl TxtLookup for MockLookup {
        fn lookup_txt(&self, name: &str) -> Result<Vec<TxtRecord>, DnsError> {
            (self.0)(name)
        }
    }

    fn no_dns() -> MockLookup {
        MockLookup(Box::new(|_| Err(DnsError::NoRecords)))
    }

    fn serving(record: &'static str) -> MockLookup {
        MockLookup(Box::new(move |_| Ok(vec![TxtRecord::from(record)])))
    }

    fn message_with_signature(tags: &str) -> Vec<u8> {
        let mut message = format!("DKIM-Signature: {tags}\r\n").into_bytes();
        message.extend_from_slice(b"From: me@example.com\r\nTo: you@example.org\r\n\r\nHi!\r\n");
        message
    }

    fn single_result(verifier: &Verifier<MockLookup>, message: &[u8]) -> SignatureResult {
        let report = verifier.verify(message).unwrap();
        assert_eq!(report.signatures.len(), 1);
        report.signatures.into_iter().next().unwrap()
    }

    fn has_permfail(result: &SignatureResult, needle: &str) -> bool {
        result
            .diagnostics
            .iter()
            .any(|d| d.status == Status::Permfail && d.reason.contains(needle))
    }

    const COMPLETE_TAGS: &str = "v=1; a=rsa-sha256; c=relaxed/relaxed; d=example.com; s=sel; \
                                 h=from:to; bh=MTIz; b=NDU2";

    #[test]
    fn report_without_signatures() {
        let verifier = Verifier::new(no_dns());

        let report = verifier.verify(b"From: me@example.com\r\n\r\nHi!\r\n").unwrap();

        assert!(report.signatures.is_empty());
        assert!(!report.passes());
    }

    #[test]
    fn invalid_message_is_an_error() {
        let verifier = Verifier::new(no_dns());

        assert_eq!(verifier.verify(b""), Err(InvalidMessage::Empty));
    }

    #[test]
    fn missing_required_tags() {
        let verifier = Verifier::new(no_dns());

        let result = single_result(&verifier, &message_with_signature("v=1; d=example.com"));

        for tag in ["a", "b", "bh", "h", "s"] {
            assert!(has_permfail(&result, &format!("{tag}= tag missing")));
        }
        assert!(result
            .diagnostics
            .contains(&Diagnostic::info("v= tag present")));
        assert!(!result.verified);
    }

    #[test]
    fn malformed_tag_list() {
        let verifier = Verifier::new(no_dns());

        let result = single_result(&verifier, &message_with_signature("v=1; nonsense"));

        assert!(has_permfail(&result, "malformed tag list"));
        assert!(result.signature.is_none());
    }

    #[test]
    fn unsupported_version() {
        let verifier = Verifier::new(no_dns());

        let tags = COMPLETE_TAGS.replace("v=1", "v=2");
        let result = single_result(&verifier, &message_with_signature(&tags));

        assert!(has_permfail(&result, "unsupported version"));
    }

    #[test]
    fn from_header_not_signed() {
        let verifier = Verifier::new(no_dns());

        let tags = COMPLETE_TAGS.replace("h=from:to", "h=date:subject");
        let result = single_result(&verifier, &message_with_signature(&tags));

        assert!(has_permfail(&result, "From header not included"));
        // precondition failure short-circuits before DNS, so no TEMPFAIL
        assert!(!result
            .diagnostics
            .iter()
            .any(|d| d.status == Status::Tempfail));
    }

    #[test]
    fn expiry_checks() {
        let mut verifier = Verifier::new(no_dns());
        verifier.config_mut().current_time = Some(3000);

        let tags = format!("{COMPLETE_TAGS}; t=1000; x=2000");
        let result = single_result(&verifier, &message_with_signature(&tags));
        assert!(has_permfail(&result, "signature expired"));

        let tags = format!("{COMPLETE_TAGS}; t=5000; x=4000");
        let result = single_result(&verifier, &message_with_signature(&tags));
        assert!(has_permfail(&result, "x= expiration before t= timestamp"));

        // x == t is acceptable
        let tags = format!("{COMPLETE_TAGS}; t=4000; x=4000");
        let result = single_result(&verifier, &message_with_signature(&tags));
        assert!(!has_permfail(&result, "expiration"));
        assert!(!has_permfail(&result, "expired"));
    }

    #[test]
    fn unknown_query_method() {
        let verifier = Verifier::new(no_dns());

        let tags = format!("{COMPLETE_TAGS}; q=private/exchange");
        let result = single_result(&verifier, &message_with_signature(&tags));

        assert!(has_permfail(&result, "query method"));
    }

    #[test]
    fn identity_must_match_domain() {
        let verifier = Verifier::new(no_dns());

        let tags = format!("{COMPLETE_TAGS}; i=@example.org");
        let result = single_result(&verifier, &message_with_signature(&tags));
        assert!(has_permfail(&result, "i= identity"));

        let tags = format!("{COMPLETE_TAGS}; i=user@mail.EXAMPLE.com");
        let result = single_result(&verifier, &message_with_signature(&tags));
        assert!(!has_permfail(&result, "i= identity"));
    }

    #[test]
    fn excessive_body_length() {
        let verifier = Verifier::new(no_dns());

        let tags = format!("{COMPLETE_TAGS}; l=10000");
        let result = single_result(&verifier, &message_with_signature(&tags));

        assert!(has_permfail(&result, "l= tag exceeds"));
    }

    #[test]
    fn dns_failure_is_tempfail() {
        // body hash of "Hi!\r\n" is wrong in COMPLETE_TAGS, but the lookup
        // failure is diagnosed before the body hash comparison
        let verifier = Verifier::new(no_dns());

        let result = single_result(&verifier, &message_with_signature(COMPLETE_TAGS));

        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.status == Status::Tempfail && d.reason.contains("no key records")));
        assert!(!result.verified);
    }

    #[test]
    fn invalid_selector_is_permfail() {
        let verifier = Verifier::new(no_dns());

        let tags = COMPLETE_TAGS.replace("s=sel", "s=_sel");
        let result = single_result(&verifier, &message_with_signature(&tags));

        assert!(has_permfail(&result, "invalid selector"));
    }

    #[test]
    fn body_hash_mismatch() {
        let verifier = Verifier::new(serving("v=DKIM1; k=rsa; p=YWJj"));

        let result = single_result(&verifier, &message_with_signature(COMPLETE_TAGS));

        assert!(has_permfail(&result, "body hash mismatch"));
        assert!(!result.verified);
    }

    #[test]
    fn duplicate_tags_reported() {
        let verifier = Verifier::new(no_dns());

        let tags = format!("{COMPLETE_TAGS}; d=other.example");
        let result = single_result(&verifier, &message_with_signature(&tags));

        assert!(result
            .diagnostics
            .contains(&Diagnostic::info("duplicate d= tag, last value used")));
        // last occurrence wins
        assert_eq!(
            result.signature.as_ref().map(|sig| &*sig.domain),
            Some("other.example"),
        );
    }

    #[test]
    fn report_passes_requires_exactly_one_signature() {
        let clean = SignatureResult {
            header_index: 0,
            signature: None,
            diagnostics: vec![Diagnostic::info("signature verified")],
            verified: true,
        };

        let report = Report {
            signatures: vec![clean.clone()],
        };
        assert!(report.passes());

        let report = Report {
            signatures: vec![clean.clone(), clean.clone()],
        };
        assert!(!report.passes());

        let mut failed = clean;
        failed.diagnostics.push(Diagnostic::tempfail("later failure"));
        let report = Report {
            signatures: vec![failed],
        };
        assert!(!report.passes());
    }

    #[test]
    fn check_key_record_mismatches() {
        let mut diagnostics = vec![];
        let header = Header::new("DKIM-Signature", COMPLETE_TAGS.as_bytes().to_vec()).unwrap();
        let sig = extract_signature(&header, 0, &mut diagnostics).unwrap();

        let record: KeyRecord = "v=DKIM1; p=YWJj".parse().unwrap();
        assert_eq!(check_key_record(&record, &sig), Ok(()));

        let record: KeyRecord = "v=DKIM2; p=YWJj".parse().unwrap();
        assert_eq!(
            check_key_record(&record, &sig),
            Err("unsupported key record version"),
        );

        let record: KeyRecord = "v=DKIM1; k=ed25519; p=YWJj".parse().unwrap();
        assert_eq!(check_key_record(&record, &sig), Err("wrong key type"));

        let record: KeyRecord = "v=DKIM1; h=sha1; p=YWJj".parse().unwrap();
        assert_eq!(
            check_key_record(&record, &sig),
            Err("hash algorithm not allowed by key record"),
        );

        let record: KeyRecord = "v=DKIM1; s=web; p=YWJj".parse().unwrap();
        assert_eq!(
            check_key_record(&record, &sig),
            Err("service type not allowed by key record"),
        );

        let record: KeyRecord = "v=DKIM1; p=".parse().unwrap();
        assert_eq!(check_key_record(&record, &sig), Err("revoked key"));
    }
}
