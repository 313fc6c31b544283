//! Request signing seam
//!
//! The marketplace requires every open-API call to carry a signature. The
//! scheme itself is owned by the integration layer; the client only needs
//! an opaque `sign(request) -> signature` capability.

use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Opaque signing capability for outbound marketplace requests.
pub trait RequestSigner: Send + Sync {
    /// Sign a request from its path, query parameters and raw body.
    fn sign(&self, path: &str, params: &[(&str, String)], body: &[u8]) -> String;
}

/// HMAC-SHA256 signer keyed by the app secret.
///
/// Digest input is the path, then the query parameters in key order, then
/// the raw body — so the signature is stable regardless of the order the
/// client assembled the parameters in.
pub struct HmacSha256Signer {
    app_secret: String,
}

impl HmacSha256Signer {
    pub fn new(app_secret: String) -> Self {
        Self { app_secret }
    }
}

impl RequestSigner for HmacSha256Signer {
    fn sign(&self, path: &str, params: &[(&str, String)], body: &[u8]) -> String {
        let mut sorted: Vec<&(&str, String)> = params.iter().collect();
        sorted.sort_by_key(|(key, _)| *key);

        let mut mac = Hmac::<Sha256>::new_from_slice(self.app_secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(path.as_bytes());
        for (key, value) in sorted {
            mac.update(key.as_bytes());
            mac.update(value.as_bytes());
        }
        mac.update(body);

        hex::encode(mac.finalize().into_bytes())
    }
}
