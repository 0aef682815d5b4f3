use thiserror::Error;

/// Errors raised by key derivation, the CBC cipher and the envelope codec.
///
/// Every variant is fatal to the operation that produced it. Messages never
/// contain key material, passwords or plaintext.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("invalid key size: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid IV size: expected {expected} bytes, got {actual}")]
    InvalidIvLength { expected: usize, actual: usize },

    /// Only raised with [`Padding::None`](crate::Padding::None), which also
    /// rejects empty plaintext.
    #[error("plaintext length {0} is not a non-empty multiple of the 16 byte block size")]
    InvalidPlaintextLength(usize),

    #[error("ciphertext length {0} is not a non-empty multiple of the 16 byte block size")]
    InvalidCiphertextLength(usize),

    /// CBC carries no authentication tag, so this only fires when PKCS#7
    /// unpadding fails. A wrong password can also decrypt to garbage.
    #[error("Invalid password or corrupted data")]
    DecryptionKeyMismatch,

    #[error("invalid KDF parameters: {0}")]
    InvalidKdfParams(String),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("OS random generator unavailable")]
    Randomness,

    #[error("malformed envelope: {0}")]
    Format(String),

    #[error("unsupported envelope version: {0}")]
    UnsupportedVersion(u8),
}
