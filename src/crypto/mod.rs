//! Cryptographic primitives for password-based encryption.
//!
//! Provides PBKDF2 key derivation, AES-256-CBC encryption and salt/IV generation.

pub mod cbc;
pub mod kdf;

pub use cbc::{Padding, decrypt, encrypt, generate_iv, generate_salt};
pub use kdf::{KdfParams, derive_key};

/// Length of the salt (16 bytes).
pub const SALT_LEN: usize = 16;
/// Length of the initialization vector (one AES block).
pub const IV_LEN: usize = 16;
/// Length of the encryption key (32 bytes / AES-256).
pub const KEY_LEN: usize = 32;
/// AES block size.
pub const BLOCK_LEN: usize = 16;
