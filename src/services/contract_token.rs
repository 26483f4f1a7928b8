use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Per-booking access key for the contract endpoints: HMAC over the booking
/// id and its on-file email, base64url without padding. Stable (nothing to
/// store) and distinct from both the moderation-link signature and the OTP.
/// The signing secret is required at startup, so there is no unsigned mode.
pub fn create(secret: &str, rid: &str, email: &str) -> Option<String> {
    let rid = rid.trim();
    let email_norm = email.trim().to_lowercase();
    if rid.is_empty() || email_norm.is_empty() || secret.is_empty() {
        return None;
    }

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(format!("{rid}.{email_norm}").as_bytes());
    let digest = mac.finalize().into_bytes();

    Some(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest))
}

/// Constant-time comparison against a freshly recomputed token.
pub fn verify(secret: &str, rid: &str, email: &str, token: &str) -> bool {
    match create(secret, rid, email) {
        Some(expected) => expected.as_bytes().ct_eq(token.as_bytes()).into(),
        None => false,
    }
}
