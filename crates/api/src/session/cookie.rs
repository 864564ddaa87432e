//! Signed session-cookie primitives.
//!
//! Cookie values use the `s:<token>.<signature>` layout where the signature
//! is base64(HMAC-SHA256(token, secret)) without padding. Verification is
//! constant-time via the `hmac` crate.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Name of the session cookie.
pub const SESSION_COOKIE_NAME: &str = "roster_session";

/// Length of generated session tokens.
const TOKEN_LENGTH: usize = 32;

/// Generate a new random session token.
pub fn generate_token() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Sign `value`, producing the `s:<value>.<signature>` cookie payload.
pub fn sign(value: &str, secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(value.as_bytes());
    let signature = STANDARD_NO_PAD.encode(mac.finalize().into_bytes());
    format!("s:{value}.{signature}")
}

/// Verify a signed cookie payload and return the embedded value.
///
/// Returns `None` for a missing prefix, malformed layout, undecodable
/// signature, or signature mismatch.
pub fn unsign(signed: &str, secret: &str) -> Option<String> {
    let rest = signed.strip_prefix("s:")?;
    let (value, signature) = rest.rsplit_once('.')?;
    let signature = STANDARD_NO_PAD.decode(signature).ok()?;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(value.as_bytes());
    mac.verify_slice(&signature).ok()?;

    Some(value.to_string())
}

/// Extract a named cookie's value from a `Cookie` request header.
pub fn cookie_value(header: &str, name: &str) -> Option<String> {
    for cookie in header.split(';') {
        let cookie = cookie.trim();
        if let Some(value) = cookie.strip_prefix(name) {
            if let Some(value) = value.strip_prefix('=') {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Build a `Cookie` header value carrying a signed session token.
pub fn header_value(token: &str, secret: &str) -> String {
    format!("{SESSION_COOKIE_NAME}={}", sign(token, secret))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_unsign_round_trips() {
        let signed = sign("abc123", "secret");
        assert!(signed.starts_with("s:abc123."));
        assert_eq!(unsign(&signed, "secret").as_deref(), Some("abc123"));
    }

    #[test]
    fn tampered_value_fails_verification() {
        let signed = sign("abc123", "secret");
        let tampered = signed.replace("abc123", "abc124");
        assert_eq!(unsign(&tampered, "secret"), None);
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let signed = sign("abc123", "secret");
        assert_eq!(unsign(&signed, "other-secret"), None);
    }

    #[test]
    fn missing_prefix_or_separator_is_rejected() {
        assert_eq!(unsign("abc123.sig", "secret"), None);
        assert_eq!(unsign("s:abc123", "secret"), None);
        assert_eq!(unsign("", "secret"), None);
    }

    #[test]
    fn undecodable_signature_is_rejected() {
        assert_eq!(unsign("s:abc123.!!!not-base64!!!", "secret"), None);
    }

    #[test]
    fn cookie_value_finds_named_cookie() {
        let header = "theme=dark; roster_session=s:tok.sig; lang=en";
        assert_eq!(
            cookie_value(header, SESSION_COOKIE_NAME).as_deref(),
            Some("s:tok.sig")
        );
    }

    #[test]
    fn cookie_value_misses_absent_cookie() {
        assert_eq!(cookie_value("theme=dark", SESSION_COOKIE_NAME), None);
    }

    #[test]
    fn generated_tokens_are_unique_and_sized() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), TOKEN_LENGTH);
        assert_ne!(a, b);
    }
}
