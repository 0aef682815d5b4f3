//! Password-based encryption with AES-256-CBC and PBKDF2-HMAC-SHA256.
//!
//! [`PasswordCipher`] derives a fresh key for every message from the password
//! and a random salt, encrypts under a random IV and hands back an
//! [`EncryptedEnvelope`] holding everything but the password.
//!
//! CBC provides no integrity. A wrong password, salt or IV is reported only
//! when PKCS#7 unpadding happens to fail; otherwise it yields garbage.

pub mod align;
pub mod crypto;
mod envelope;
mod error;
pub mod format;
pub mod sensors;
pub mod sequence;
mod storage;

pub use crate::crypto::{KdfParams, Padding};
pub use crate::envelope::EncryptedEnvelope;
pub use crate::error::CipherError;
pub use crate::storage::Storage;

use std::fmt;

use tracing::{debug, instrument};
use zeroize::Zeroizing;

use crate::crypto::KEY_LEN;

/// Encrypts and decrypts byte payloads under one password.
///
/// Holds no per-message state: every call draws its own salt and IV, so a
/// single instance can be shared across threads.
pub struct PasswordCipher {
    password: Zeroizing<String>,
    kdf: KdfParams,
    padding: Padding,
}

impl fmt::Debug for PasswordCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordCipher")
            .field("password", &"<redacted>")
            .field("kdf", &self.kdf)
            .field("padding", &self.padding)
            .finish()
    }
}

impl PasswordCipher {
    pub fn new(password: Zeroizing<String>) -> Self {
        Self::with_params(password, KdfParams::default(), Padding::default())
    }

    pub fn with_params(password: Zeroizing<String>, kdf: KdfParams, padding: Padding) -> Self {
        Self {
            password,
            kdf,
            padding,
        }
    }

    pub fn kdf(&self) -> KdfParams {
        self.kdf
    }

    pub fn padding(&self) -> Padding {
        self.padding
    }

    /// Derives `length` key bytes from the password and `salt`.
    pub fn derive_key(&self, salt: &[u8], length: usize) -> Result<Zeroizing<Vec<u8>>, CipherError> {
        crypto::derive_key(&self.password, salt, self.kdf, length)
    }

    /// Encrypts `plaintext` under a fresh salt and IV.
    #[instrument(skip_all, fields(len = plaintext.len()))]
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<EncryptedEnvelope, CipherError> {
        let salt = crypto::generate_salt()?;
        let iv = crypto::generate_iv()?;
        let key = self.derive_key(&salt, KEY_LEN)?;

        let ciphertext = crypto::encrypt(&key, &iv, plaintext, self.padding)?;
        debug!(
            iterations = self.kdf.iterations(),
            padding = ?self.padding,
            ciphertext_len = ciphertext.len(),
            "encrypted payload"
        );

        Ok(EncryptedEnvelope::new(
            self.kdf,
            self.padding,
            salt,
            iv,
            ciphertext,
        ))
    }

    /// Decrypts `ciphertext` with the salt and IV it was produced with, using
    /// this cipher's KDF cost and padding mode.
    #[instrument(skip_all, fields(len = ciphertext.len()))]
    pub fn decrypt(
        &self,
        ciphertext: &[u8],
        salt: &[u8],
        iv: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, CipherError> {
        self.decrypt_with(ciphertext, salt, iv, self.kdf, self.padding)
    }

    /// Decrypts an envelope, taking KDF cost and padding from the envelope.
    pub fn open(&self, envelope: &EncryptedEnvelope) -> Result<Zeroizing<Vec<u8>>, CipherError> {
        envelope.validate()?;
        self.decrypt_with(
            envelope.ciphertext(),
            envelope.salt(),
            envelope.iv(),
            envelope.kdf()?,
            envelope.padding(),
        )
    }

    /// Encrypts straight into the binary container.
    pub fn encrypt_to_bytes(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        self.encrypt(plaintext)?.to_bytes()
    }

    /// Parses the binary container and decrypts it.
    pub fn decrypt_from_bytes(&self, data: &[u8]) -> Result<Zeroizing<Vec<u8>>, CipherError> {
        let envelope = EncryptedEnvelope::from_bytes(data)?;
        self.open(&envelope)
    }

    fn decrypt_with(
        &self,
        ciphertext: &[u8],
        salt: &[u8],
        iv: &[u8],
        kdf: KdfParams,
        padding: Padding,
    ) -> Result<Zeroizing<Vec<u8>>, CipherError> {
        let key = crypto::derive_key(&self.password, salt, kdf, KEY_LEN)?;
        let plaintext = crypto::decrypt(&key, iv, ciphertext, padding)?;
        debug!(
            iterations = kdf.iterations(),
            plaintext_len = plaintext.len(),
            "decrypted payload"
        );
        Ok(plaintext)
    }
}
