//! Binary container for [`EncryptedEnvelope`].
//!
//! Provides version-aware parsing and serialization so older files keep
//! opening after the layout changes.

use crate::envelope::EncryptedEnvelope;
use crate::error::CipherError;

pub mod v1;

/// Magic bytes identifying a pwcrypt envelope ("PWCR").
pub const MAGIC: &[u8; 4] = b"PWCR";
/// Length of magic bytes.
pub const MAGIC_LEN: usize = 4;
/// Length of version field.
pub const VER_LEN: usize = 1;
/// Latest format version
pub const CURRENT_VERSION: u8 = v1::VERSION_V1;

/// Returns `true` if `data` starts with the envelope magic.
pub fn is_envelope(data: &[u8]) -> bool {
    data.len() >= MAGIC_LEN && &data[..MAGIC_LEN] == MAGIC
}

/// Parses a binary envelope.
///
/// Automatically dispatches to the appropriate version parser.
///
/// # Errors
///
/// Returns an error if:
/// - The data is too short
/// - The magic bytes are invalid
/// - The version is unsupported
/// - Any field violates the envelope invariants
pub fn parse(data: &[u8]) -> Result<EncryptedEnvelope, CipherError> {
    if data.len() < MAGIC_LEN + VER_LEN {
        return Err(CipherError::Format("envelope too short".into()));
    }

    if !is_envelope(data) {
        return Err(CipherError::Format("invalid magic".into()));
    }

    match data[MAGIC_LEN] {
        v1::VERSION_V1 => v1::parse(data),
        other => Err(CipherError::UnsupportedVersion(other)),
    }
}

/// Serializes an envelope in the format matching its version.
pub fn serialize(envelope: &EncryptedEnvelope) -> Result<Vec<u8>, CipherError> {
    match envelope.version() {
        v1::VERSION_V1 => v1::serialize(envelope),
        other => Err(CipherError::UnsupportedVersion(other)),
    }
}
