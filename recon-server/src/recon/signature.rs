//! Webhook signature verification
//!
//! Pure functions over the raw request body. Verification happens before
//! any parsing or store lookup: a forged request must cost nothing and
//! learn nothing. All comparisons are constant-time.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256, Sha512};

type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;

/// Provider MAC scheme
///
/// Which fields are covered and how the secret is used differs per
/// provider; the hex tag convention is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureScheme {
    /// HMAC-SHA256 over the raw body, hex tag
    HmacSha256,
    /// HMAC-SHA512 over the raw body, hex tag
    HmacSha512,
    /// Keyed digest: SHA-512 over `body || '|' || secret`, hex tag
    Sha512Appended,
}

/// Compute the expected hex tag for a payload
pub fn sign(payload: &[u8], secret: &str, scheme: SignatureScheme) -> String {
    match scheme {
        SignatureScheme::HmacSha256 => {
            let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
                .expect("HMAC can take key of any size");
            mac.update(payload);
            hex::encode(mac.finalize().into_bytes())
        }
        SignatureScheme::HmacSha512 => {
            let mut mac = HmacSha512::new_from_slice(secret.as_bytes())
                .expect("HMAC can take key of any size");
            mac.update(payload);
            hex::encode(mac.finalize().into_bytes())
        }
        SignatureScheme::Sha512Appended => {
            let mut hasher = Sha512::new();
            hasher.update(payload);
            hasher.update(b"|");
            hasher.update(secret.as_bytes());
            hex::encode(hasher.finalize())
        }
    }
}

/// Verify a provider signature against the raw payload
///
/// Returns `false` on any malformed input; never panics. The caller treats
/// `false` as "reject with a client error, do not process".
pub fn verify(payload: &[u8], provided: &str, secret: &str, scheme: SignatureScheme) -> bool {
    let provided = provided.trim();
    if provided.is_empty() || secret.is_empty() {
        return false;
    }
    let expected = sign(payload, secret, scheme);
    constant_time_eq(expected.as_bytes(), provided.to_ascii_lowercase().as_bytes())
}

/// Verify the client-confirmation handshake
///
/// The gateway hands the browser a signature over
/// `"{order_ref}|{payment_id}"` computed with the merchant key secret; the
/// client echoes it back when confirming the payment.
pub fn verify_handshake(order_ref: &str, payment_id: &str, provided: &str, secret: &str) -> bool {
    let message = format!("{}|{}", order_ref, payment_id);
    verify(message.as_bytes(), provided, secret, SignatureScheme::HmacSha256)
}

/// Constant-time comparison of a static webhook token
pub fn token_matches(provided: &str, expected: &str) -> bool {
    if expected.is_empty() {
        return false;
    }
    constant_time_eq(provided.trim().as_bytes(), expected.as_bytes())
}

/// Constant-time byte comparison (length check + XOR fold)
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
