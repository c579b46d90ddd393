use rand::Rng;
use sha2::{Digest, Sha256};

/// Compute SHA256 hash of input bytes
pub fn sha256(input: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(input);
    hasher.finalize().into()
}

/// Hex-encoded SHA256, used for storing one-time codes
pub fn sha256_hex(input: &str) -> String {
    hex::encode(sha256(input.as_bytes()))
}

/// Numeric one-time password with exactly `digits` digits (no leading zero).
pub fn generate_otp(digits: u32) -> String {
    let digits = digits.clamp(1, 9);
    let low = 10u32.pow(digits - 1);
    let high = 10u32.pow(digits);
    rand::thread_rng().gen_range(low..high).to_string()
}

/// Constant-time comparison of two hex digests
pub fn digest_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
