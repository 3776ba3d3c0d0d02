//! Session key fingerprinting.
//!
//! Start-up logs the fingerprint of the active cookie key so operators can
//! confirm that every replica shares one key, and can tell when a rotation
//! has landed, without the key material ever reaching a log line.

use actix_web::cookie::Key;
use sha2::{Digest, Sha256};

/// Bytes of the digest kept before hex encoding.
const FINGERPRINT_BYTES: usize = 8;

/// Truncated SHA-256 digest of the key's signing half, hex encoded.
///
/// # Examples
///
/// ```rust
/// use actix_web::cookie::Key;
/// use storefront::inbound::http::session_config::fingerprint::key_fingerprint;
///
/// let fingerprint = key_fingerprint(&Key::generate());
/// assert_eq!(fingerprint.len(), 16);
/// ```
#[must_use]
pub fn key_fingerprint(key: &Key) -> String {
    let digest = Sha256::digest(key.signing());
    hex::encode(digest.iter().take(FINGERPRINT_BYTES).copied().collect::<Vec<u8>>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn derived_keys_fingerprint_stably() {
        let key = Key::derive_from(&[b'k'; 64]);

        let fingerprint = key_fingerprint(&key);

        assert_eq!(fingerprint, key_fingerprint(&Key::derive_from(&[b'k'; 64])));
        assert_eq!(fingerprint.len(), FINGERPRINT_BYTES * 2);
        assert!(
            fingerprint
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
    }

    #[rstest]
    fn distinct_keys_fingerprint_differently() {
        let first = Key::derive_from(&[b'a'; 64]);
        let second = Key::derive_from(&[b'b'; 64]);

        assert_ne!(key_fingerprint(&first), key_fingerprint(&second));
    }
}
