use rsa::{pkcs8::EncodePublicKey, Pkcs1v15Sign, RsaPrivateKey};
use sha2::{Digest, Sha256};
use veridkim::{
    canonicalize, crypto, signature::Canonicalization, DnsError, Message, TxtLookup, TxtRecord,
};

pub struct MockLookup(Box<dyn Fn(&str) -> Result<Vec<TxtRecord>, DnsError> + Send + Sync>);

impl MockLookup {
    pub fn new(f: impl Fn(&str) -> Result<Vec<TxtRecord>, DnsError> + Send + Sync + 'static) -> Self {
        Self(Box::new(f))
    }
}

impl TxtLookup for MockLookup {
    fn lookup_txt(&self, name: &str) -> Result<Vec<TxtRecord>, DnsError> {
        (self.0)(name)
    }
}

pub struct TestKey {
    pub private_key: RsaPrivateKey,
    /// A ready-made `v=DKIM1; k=rsa; p=...` TXT record for the key.
    pub record: String,
}

pub fn generate_key() -> TestKey {
    let mut rng = rand::thread_rng();
    let private_key = RsaPrivateKey::new(&mut rng, 1024).expect("key generation");
    let public_der = private_key.to_public_key().to_public_key_der().unwrap();

    let record = format!(
        "v=DKIM1; k=rsa; p={}",
        crypto::encode_base64(public_der.as_bytes()),
    );

    TestKey {
        private_key,
        record,
    }
}

/// Signs a message and returns the complete raw bytes, `DKIM-Signature`
/// header first. `header_block` must use CRLF endings and end with CRLF;
/// `signed_headers` is a colon-separated h= value; `extra_tags` are
/// inserted verbatim into the tag list.
pub fn sign_message(
    key: &RsaPrivateKey,
    canonicalization: &str,
    domain: &str,
    selector: &str,
    signed_headers: &str,
    extra_tags: &[&str],
    header_block: &str,
    body: &[u8],
) -> Vec<u8> {
    let canon: Canonicalization = canonicalization.parse().unwrap();

    let unsigned = [header_block.as_bytes(), b"\r\n", body].concat();
    let message = Message::parse(&unsigned).unwrap();

    let canonical_body = canonicalize::canonicalize_body(canon.body, message.body());
    let bh = crypto::encode_base64(Sha256::digest(&canonical_body));

    let mut extra = String::new();
    for tag in extra_tags {
        extra.push_str(tag);
        extra.push_str("; ");
    }

    let sig_value = format!(
        " v=1; a=rsa-sha256; c={canonicalization}; d={domain}; s={selector}; \
         {extra}h={signed_headers}; bh={bh}; b=",
    );

    let names: Vec<&str> = signed_headers.split(':').collect();
    let mut data =
        canonicalize::canonicalize_signed_headers(canon.header, message.headers(), &names);
    canonicalize::canonicalize_header(
        &mut data,
        canon.header,
        "DKIM-Signature",
        sig_value.as_bytes(),
    );

    let digest = Sha256::digest(&data);
    let signature = key
        .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
        .expect("signing");
    let b = crypto::encode_base64(signature);

    let mut raw = format!("DKIM-Signature:{sig_value}{b}\r\n").into_bytes();
    raw.extend_from_slice(header_block.as_bytes());
    raw.extend_from_slice(b"\r\n");
    raw.extend_from_slice(body);
    raw
}

pub const HEADER_BLOCK: &str = "From: Joe SixPack <joe@football.example.com>\r\n\
                                To: Suzie Q <suzie@shopping.example.net>\r\n\
                                Subject: Is dinner ready?\r\n";

pub const BODY: &[u8] = b"Hi.\r\n\r\nWe lost the game. Are you hungry yet?\r\n\r\nJoe.\r\n";
