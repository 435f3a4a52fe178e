//! Message integrity signing.
//!
//! Signatures are hex-encoded HMAC-SHA256 digests over the four signed parts
//! of a wire message, in order: header, parent header, metadata, content.
//! Routing identities and binary buffers are outside the signed region.
//!
//! A signer built without a key produces empty signatures and accepts any
//! incoming signature; this matches running a kernel with no shared secret
//! configured.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{KernelError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Keyed signer/verifier for the signed parts of a message.
#[derive(Clone)]
pub struct MessageSigner {
    key: Option<Vec<u8>>,
}

impl MessageSigner {
    /// Create a signer from a shared secret. An empty key disables signing.
    pub fn new(key: &str) -> Self {
        let key = if key.is_empty() {
            None
        } else {
            Some(key.as_bytes().to_vec())
        };
        Self { key }
    }

    /// Create a signer with signing disabled.
    pub fn disabled() -> Self {
        Self { key: None }
    }

    /// Whether a shared secret is configured.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.key.is_some()
    }

    /// Sign the ordered message parts, returning a hex digest.
    ///
    /// Returns the empty string when no key is configured.
    pub fn sign(&self, parts: &[&[u8]]) -> String {
        let Some(key) = &self.key else {
            return String::new();
        };
        let mut mac = mac_for_key(key);
        for part in parts {
            mac.update(part);
        }
        hex::encode(mac.finalize().into_bytes())
    }

    /// Verify a hex signature against the ordered message parts.
    ///
    /// Verification is skipped (always succeeds) when no key is configured.
    /// Comparison is constant-time via [`Mac::verify_slice`].
    pub fn verify(&self, parts: &[&[u8]], signature: &[u8]) -> Result<()> {
        let Some(key) = &self.key else {
            return Ok(());
        };
        let supplied =
            hex::decode(signature).map_err(|_| KernelError::SignatureMismatch)?;
        let mut mac = mac_for_key(key);
        for part in parts {
            mac.update(part);
        }
        mac.verify_slice(&supplied)
            .map_err(|_| KernelError::SignatureMismatch)
    }
}

fn mac_for_key(key: &[u8]) -> HmacSha256 {
    HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length")
}

impl std::fmt::Debug for MessageSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageSigner")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARTS: &[&[u8]] = &[b"header", b"parent", b"{}", b"content"];

    #[test]
    fn test_sign_is_deterministic() {
        let signer = MessageSigner::new("secret");
        let a = signer.sign(PARTS);
        let b = signer.sign(PARTS);
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn test_sign_changes_with_any_part() {
        let signer = MessageSigner::new("secret");
        let base = signer.sign(PARTS);

        let tampered: &[&[u8]] = &[b"header", b"parent", b"{}", b"Content"];
        assert_ne!(base, signer.sign(tampered));

        let tampered: &[&[u8]] = &[b"Header", b"parent", b"{}", b"content"];
        assert_ne!(base, signer.sign(tampered));
    }

    #[test]
    fn test_sign_changes_with_key() {
        let a = MessageSigner::new("secret").sign(PARTS);
        let b = MessageSigner::new("other").sign(PARTS);
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_roundtrip() {
        let signer = MessageSigner::new("secret");
        let sig = signer.sign(PARTS);
        assert!(signer.verify(PARTS, sig.as_bytes()).is_ok());
    }

    #[test]
    fn test_verify_rejects_tampered_parts() {
        let signer = MessageSigner::new("secret");
        let sig = signer.sign(PARTS);

        let tampered: &[&[u8]] = &[b"header", b"parent", b"{}", b"evil"];
        assert!(matches!(
            signer.verify(tampered, sig.as_bytes()),
            Err(KernelError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_verify_rejects_garbage_signature() {
        let signer = MessageSigner::new("secret");
        assert!(matches!(
            signer.verify(PARTS, b"not even hex"),
            Err(KernelError::SignatureMismatch)
        ));
        assert!(matches!(
            signer.verify(PARTS, b""),
            Err(KernelError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_disabled_signer() {
        let signer = MessageSigner::disabled();
        assert!(!signer.is_enabled());
        assert_eq!(signer.sign(PARTS), "");
        // Verification is skipped entirely without a key.
        assert!(signer.verify(PARTS, b"anything").is_ok());
    }

    #[test]
    fn test_empty_key_disables_signing() {
        let signer = MessageSigner::new("");
        assert!(!signer.is_enabled());
        assert_eq!(signer.sign(PARTS), "");
    }
}
