use hmac::Hmac;
use pbkdf2::pbkdf2;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::CipherError;

/// Fewest PBKDF2 rounds accepted.
pub const MIN_ITERATIONS: u32 = 1_000;
/// Most PBKDF2 rounds accepted.
pub const MAX_ITERATIONS: u32 = 10_000_000;
/// Rounds used when the caller does not choose.
pub const DEFAULT_ITERATIONS: u32 = 600_000;
/// Longest key `derive_key` will produce (two SHA-256 blocks).
pub const MAX_DERIVED_LEN: usize = 64;

/// PBKDF2-HMAC-SHA256 cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl KdfParams {
    pub fn new(iterations: u32) -> Result<Self, CipherError> {
        let params = Self { iterations };
        params.validate()?;
        Ok(params)
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn validate(&self) -> Result<(), CipherError> {
        if self.iterations < MIN_ITERATIONS {
            return Err(CipherError::InvalidKdfParams(format!(
                "pbkdf2 iterations must be >= {MIN_ITERATIONS}"
            )));
        }
        if self.iterations > MAX_ITERATIONS {
            return Err(CipherError::InvalidKdfParams(format!(
                "pbkdf2 iterations must be <= {MAX_ITERATIONS}"
            )));
        }
        Ok(())
    }
}

/// Stretch `password` with `salt` into `length` key bytes.
///
/// Same inputs always give the same key.
pub fn derive_key(
    password: &str,
    salt: &[u8],
    kdf: KdfParams,
    length: usize,
) -> Result<Zeroizing<Vec<u8>>, CipherError> {
    kdf.validate()?;
    if length == 0 || length > MAX_DERIVED_LEN {
        return Err(CipherError::KeyDerivation(format!(
            "key length must be between 1 and {MAX_DERIVED_LEN} bytes, got {length}"
        )));
    }
    if salt.is_empty() {
        return Err(CipherError::KeyDerivation("salt must not be empty".into()));
    }

    let mut key = Zeroizing::new(vec![0u8; length]);
    pbkdf2::<Hmac<Sha256>>(password.as_bytes(), salt, kdf.iterations, &mut key)
        .map_err(|e| CipherError::KeyDerivation(format!("pbkdf2 failed: {e}")))?;

    Ok(key)
}
