use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex-encoded HMAC of the request body.
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// HMAC-SHA256 signer for webhook authentication
#[derive(Clone)]
pub struct HmacSigner {
    secret: String,
}

impl std::fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSigner")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl HmacSigner {
    /// New HMAC signer with the given secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Sign the exact bytes that will be transmitted
    pub fn sign(&self, body: &[u8]) -> String {
        hex::encode(self.mac(body).finalize().into_bytes())
    }

    /// Verify a hex signature against `body`.
    ///
    /// Malformed hex or a digest of the wrong length is a verification
    /// failure, not an error. The digest comparison itself is delegated to
    /// [`Mac::verify_slice`], which runs in constant time.
    pub fn verify(&self, body: &[u8], signature: &str) -> bool {
        let Ok(expected) = hex::decode(signature.trim()) else {
            return false;
        };

        self.mac(body).verify_slice(&expected).is_ok()
    }

    fn mac(&self, body: &[u8]) -> HmacSha256 {
        let mut mac = match HmacSha256::new_from_slice(self.secret.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => unreachable!("HMAC key can be of any size, as per crate documentation"),
        };
        mac.update(body);
        mac
    }
}

/// Compute the lowercase hex HMAC-SHA256 of `body` keyed by `secret`.
pub fn sign(body: &[u8], secret: &str) -> String {
    HmacSigner::new(secret).sign(body)
}

/// Check `signature` against `body` keyed by `secret`. Never fails loudly.
pub fn verify(body: &[u8], signature: &str, secret: &str) -> bool {
    HmacSigner::new(secret).verify(body, signature)
}
