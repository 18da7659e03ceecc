//! Hashing, random codes and secret comparison.

use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::{Rng, RngCore};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// `n` random bytes rendered as hex.
fn random_hex(n: usize) -> String {
    let mut bytes = vec![0u8; n];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Invite code: 8 random bytes as 16 uppercase hex characters.
pub fn generate_invite_code() -> String {
    random_hex(8).to_uppercase()
}

/// Temporary password for accounts created without a user-chosen one.
pub fn generate_temp_password() -> String {
    random_hex(16)
}

/// Random alphanumeric string of the given length.
pub fn generate_alphanumeric(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Compares a presented secret with the expected one in constant time.
///
/// Both values are run through HMAC keyed by the expected secret so the
/// comparison never leaks the length of either input.
pub fn secrets_match(presented: &str, expected: &str) -> bool {
    let Ok(mut expected_mac) = HmacSha256::new_from_slice(expected.as_bytes()) else {
        return false;
    };
    expected_mac.update(expected.as_bytes());
    let expected_tag = expected_mac.finalize().into_bytes();

    let Ok(mut presented_mac) = HmacSha256::new_from_slice(expected.as_bytes()) else {
        return false;
    };
    presented_mac.update(presented.as_bytes());
    presented_mac.verify_slice(&expected_tag).is_ok()
}
