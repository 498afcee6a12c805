//! Time-based one-time passwords (RFC 6238, HMAC-SHA256).
//!
//! Six digits, 30 second steps, one step of clock skew either way.
//! Secrets are configured as base64url without padding.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::{Choice, ConstantTimeEq};

type HmacSha256 = Hmac<Sha256>;

pub const DIGITS: usize = 6;
pub const STEP_SECS: u64 = 30;
pub const SKEW_STEPS: u64 = 1;
pub const MIN_SECRET_BYTES: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TotpError {
    #[error("secret is not base64url")]
    Encoding,
    #[error("secret is shorter than {MIN_SECRET_BYTES} bytes")]
    TooShort,
}

pub fn decode_secret(encoded: &str) -> Result<Vec<u8>, TotpError> {
    let secret = URL_SAFE_NO_PAD
        .decode(encoded.trim())
        .map_err(|_| TotpError::Encoding)?;
    if secret.len() < MIN_SECRET_BYTES {
        return Err(TotpError::TooShort);
    }
    Ok(secret)
}

/// The code valid during the step containing `unix_secs`.
pub fn code_at(secret: &[u8], unix_secs: u64) -> Option<String> {
    hotp(secret, unix_secs / STEP_SECS)
}

/// Check `code` against the current step and its neighbours.
pub fn verify(secret: &[u8], code: &str, unix_secs: u64) -> bool {
    let code = code.trim();
    if code.len() != DIGITS || !code.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let step = unix_secs / STEP_SECS;
    let mut matched = Choice::from(0);
    for counter in step.saturating_sub(SKEW_STEPS)..=step.saturating_add(SKEW_STEPS) {
        if let Some(expected) = hotp(secret, counter) {
            matched |= expected.as_bytes().ct_eq(code.as_bytes());
        }
    }
    matched.into()
}

fn hotp(secret: &[u8], counter: u64) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    // Dynamic truncation.
    let offset = usize::from(digest[digest.len() - 1] & 0x0f);
    let binary = u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]);
    Some(format!("{:06}", binary % 1_000_000))
}
