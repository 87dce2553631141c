use rand::Rng;
use sha2::{Digest, Sha256};
use std::fmt;
use subtle::ConstantTimeEq;

/// Number of decimal digits in a passcode.
pub const PASSCODE_LEN: usize = 6;

/// Freshly generated passcode: plaintext for delivery, hash for storage.
#[derive(Clone)]
pub struct Passcode {
    pub code: String,
    pub hash: String,
}

impl fmt::Debug for Passcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Passcode")
            .field("code", &"******")
            .field("hash", &self.hash)
            .finish()
    }
}

impl Passcode {
    /// Uniform code in 100000..=999999 from the thread-local CSPRNG.
    ///
    /// Panics only if the OS entropy source is unavailable.
    pub fn generate() -> Self {
        let n: u32 = rand::rng().random_range(100_000..=999_999);
        Self::from_code(n.to_string())
    }

    pub fn from_code(code: String) -> Self {
        let hash = hash_passcode(&code);
        Self { code, hash }
    }
}

/// Lower-case hex SHA-256 of the code.
pub fn hash_passcode(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    hex::encode(hasher.finalize())
}

/// Exactly six ASCII digits.
pub fn is_well_formed(code: &str) -> bool {
    code.len() == PASSCODE_LEN && code.bytes().all(|b| b.is_ascii_digit())
}

/// Hash `submitted` and compare against `stored_hash` in constant time.
pub fn matches_hash(submitted: &str, stored_hash: &str) -> bool {
    let computed = hash_passcode(submitted);
    computed.as_bytes().ct_eq(stored_hash.as_bytes()).into()
}
