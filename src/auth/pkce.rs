//! PKCE verifier/challenge generation for the authorization-code grant.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// A PKCE code verifier and its derived challenge.
///
/// The verifier is 64 cryptographically random bytes, base64url-encoded
/// without padding. The challenge is the base64url-encoded SHA-256 digest of
/// the verifier, also without padding (the `S256` challenge method).
pub(crate) struct PkcePair {
    /// The code verifier, sent with the token exchange.
    pub verifier: String,
    /// The code challenge, sent with the authorization request.
    pub challenge: String,
}

impl PkcePair {
    /// Generate a fresh verifier/challenge pair.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 64];
        rand::thread_rng().fill_bytes(&mut bytes);
        let verifier = URL_SAFE_NO_PAD.encode(bytes);
        let challenge = challenge_for(&verifier);
        Self {
            verifier,
            challenge,
        }
    }
}

/// Derive the `S256` challenge for a verifier.
pub(crate) fn challenge_for(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_matches_verifier() {
        for _ in 0..100 {
            let pair = PkcePair::generate();
            assert_eq!(pair.challenge, challenge_for(&pair.verifier));
        }
    }

    #[test]
    fn test_verifier_is_unpadded_base64url() {
        let pair = PkcePair::generate();
        // 64 bytes encode to 86 characters without padding.
        assert_eq!(pair.verifier.len(), 86);
        assert!(!pair.verifier.contains('='));
        assert!(!pair.verifier.contains('+'));
        assert!(!pair.verifier.contains('/'));
    }

    #[test]
    fn test_pairs_are_unique() {
        let first = PkcePair::generate();
        let second = PkcePair::generate();
        assert_ne!(first.verifier, second.verifier);
    }
}
