//! Signatures for local download links.
//!
//! signature = base64url(HMAC-SHA256(secret, expires (i64 BE) || key)).
//! The expiry is fixed-width, so no two (key, expires) pairs share a payload.

use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    #[error("Link signing secret rejected")]
    InvalidSecret,

    #[error("Link signature is malformed")]
    Malformed,

    #[error("Link signature does not match")]
    BadSignature,

    #[error("Link has expired")]
    Expired,
}

fn mac_for(secret: &[u8], key: &str, expires: i64) -> Result<HmacSha256, LinkError> {
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| LinkError::InvalidSecret)?;
    mac.update(&expires.to_be_bytes());
    mac.update(key.as_bytes());
    Ok(mac)
}

/// Sign `key` for access until the unix time `expires`.
pub fn sign(secret: &[u8], key: &str, expires: i64) -> Result<String, LinkError> {
    let tag = mac_for(secret, key, expires)?.finalize().into_bytes();
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(tag))
}

/// Check a link's signature (in constant time), then its expiry.
pub fn verify(secret: &[u8], key: &str, expires: i64, signature: &str) -> Result<(), LinkError> {
    let tag = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| LinkError::Malformed)?;
    mac_for(secret, key, expires)?
        .verify_slice(&tag)
        .map_err(|_| LinkError::BadSignature)?;

    if !link_is_live(expires) {
        return Err(LinkError::Expired);
    }
    Ok(())
}

/// Whether a link minted with `expires` is still valid.
pub fn link_is_live(expires: i64) -> bool {
    expires > chrono::Utc::now().timestamp()
}
