//! Digest and HMAC helpers shared by the payment provider modules.
//!
//! All digests are rendered as lowercase hex, which is the format every
//! supported provider uses on the wire.

use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha512};

type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;

/// HMAC-SHA256 of `data` under `key`, hex encoded.
pub fn hmac_sha256_hex(key: &str, data: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(data.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// HMAC-SHA512 of `data` under `key`, hex encoded.
pub fn hmac_sha512_hex(key: &str, data: &str) -> String {
    let mut mac = HmacSha512::new_from_slice(key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(data.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Compare a computed hex digest against one received from a provider.
///
/// Case-insensitive (VNPay sends uppercase hex) and constant-time over the
/// normalized strings.
pub fn digests_match(expected: &str, received: &str) -> bool {
    let expected = expected.to_ascii_lowercase();
    let received = received.trim().to_ascii_lowercase();
    constant_time_eq::constant_time_eq(expected.as_bytes(), received.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmac_sha256_matches_rfc4231_case_2() {
        let sig = hmac_sha256_hex("Jefe", "what do ya want for nothing?");
        assert_eq!(
            sig,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn hmac_sha512_matches_rfc4231_case_2() {
        let sig = hmac_sha512_hex("Jefe", "what do ya want for nothing?");
        assert_eq!(
            sig,
            "164b7a7bfcf819e2e395fbe73b56e0a387bd64222e831fd610270cd7ea250554\
             9758bf75c05a994a6d034f65f8f0e6fdcaeab1a34d4a6b4b636e070a38bce737"
        );
    }

    #[test]
    fn hmac_differs_with_different_secret() {
        assert_ne!(hmac_sha256_hex("a", "payload"), hmac_sha256_hex("b", "payload"));
        assert_ne!(hmac_sha512_hex("a", "payload"), hmac_sha512_hex("b", "payload"));
    }

    #[test]
    fn digests_match_ignores_case() {
        let sig = hmac_sha512_hex("secret", "payload");
        assert!(digests_match(&sig, &sig.to_ascii_uppercase()));
    }

    #[test]
    fn digests_match_rejects_tampered_digest() {
        let sig = hmac_sha256_hex("secret", "payload");
        let mut tampered = sig.clone();
        tampered.replace_range(0..1, if sig.starts_with('0') { "1" } else { "0" });
        assert!(!digests_match(&sig, &tampered));
        assert!(!digests_match(&sig, ""));
    }
}
