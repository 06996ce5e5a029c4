//! Event signatures
//!
//! Events carry `X-Promptrun-Signature: sha256=<hex HMAC-SHA256(key, body)>`.
//! The dispatcher signs, the trigger endpoint verifies.

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature
pub const SIGNATURE_HEADER: &str = "x-promptrun-signature";

const SIGNATURE_PREFIX: &str = "sha256=";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("missing event signature")]
    Missing,

    #[error("malformed event signature")]
    Malformed,

    #[error("event signature mismatch")]
    Mismatch,

    #[error("invalid signing key")]
    InvalidKey,
}

/// Signs and verifies event bodies with a shared key
#[derive(Clone)]
pub struct EventSigner {
    keyed: HmacSha256,
}

impl EventSigner {
    pub fn new(key: impl AsRef<[u8]>) -> Result<Self, SignatureError> {
        let keyed = <HmacSha256 as KeyInit>::new_from_slice(key.as_ref())
            .map_err(|_| SignatureError::InvalidKey)?;
        Ok(Self { keyed })
    }

    fn mac(&self, body: &[u8]) -> HmacSha256 {
        let mut mac = self.keyed.clone();
        mac.update(body);
        mac
    }

    /// Header value for `body`
    pub fn sign(&self, body: &[u8]) -> String {
        let digest = self.mac(body).finalize().into_bytes();
        format!("{SIGNATURE_PREFIX}{}", hex::encode(digest))
    }

    /// Check a header value against `body` in constant time
    pub fn verify(&self, body: &[u8], header: Option<&str>) -> Result<(), SignatureError> {
        let header = header.map(str::trim).filter(|h| !h.is_empty()).ok_or(SignatureError::Missing)?;
        let hex_digest = header
            .strip_prefix(SIGNATURE_PREFIX)
            .ok_or(SignatureError::Malformed)?;
        let provided = hex::decode(hex_digest).map_err(|_| SignatureError::Malformed)?;

        self.mac(body)
            .verify_slice(&provided)
            .map_err(|_| SignatureError::Mismatch)
    }
}

impl std::fmt::Debug for EventSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSigner").field("key", &"[REDACTED]").finish()
    }
}
