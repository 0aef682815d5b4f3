//! Envelope format v1.
//!
//! ```text
//! MAGIC (4) | VERSION (1) | ITERATIONS (4, LE) | PADDING (1) | SALT (16) | IV (16) | CIPHERTEXT
//! ```

use super::{MAGIC, MAGIC_LEN, VER_LEN};
use crate::crypto::{IV_LEN, KdfParams, Padding, SALT_LEN};
use crate::envelope::EncryptedEnvelope;
use crate::error::CipherError;

/// Format version 1.
pub const VERSION_V1: u8 = 1;

const ITER_LEN: usize = 4;
const PAD_LEN: usize = 1;

pub const HEADER_LEN: usize = MAGIC_LEN + VER_LEN + ITER_LEN + PAD_LEN + SALT_LEN + IV_LEN;

fn field<const N: usize>(data: &[u8], offset: &mut usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&data[*offset..*offset + N]);
    *offset += N;
    out
}

/// Parses a v1 envelope.
///
/// # Errors
///
/// Returns an error if the data is too short or carries invalid parameters.
pub fn parse(data: &[u8]) -> Result<EncryptedEnvelope, CipherError> {
    if data.len() < HEADER_LEN {
        return Err(CipherError::Format("envelope too short for v1".into()));
    }

    let mut offset = MAGIC_LEN + VER_LEN;

    let iterations = u32::from_le_bytes(field::<ITER_LEN>(data, &mut offset));
    let [padding] = field::<PAD_LEN>(data, &mut offset);
    let salt = field::<SALT_LEN>(data, &mut offset);
    let iv = field::<IV_LEN>(data, &mut offset);
    let ciphertext = data[offset..].to_vec();

    let envelope = EncryptedEnvelope::new(
        KdfParams::new(iterations)?,
        Padding::from_byte(padding)?,
        salt,
        iv,
        ciphertext,
    );
    envelope.validate()?;

    Ok(envelope)
}

/// Serializes an envelope to v1 bytes.
///
/// # Errors
///
/// Returns an error if the envelope is not v1 or fails validation.
pub fn serialize(envelope: &EncryptedEnvelope) -> Result<Vec<u8>, CipherError> {
    if envelope.version() != VERSION_V1 {
        return Err(CipherError::UnsupportedVersion(envelope.version()));
    }
    envelope.validate()?;

    let mut buf = Vec::with_capacity(HEADER_LEN + envelope.ciphertext().len());

    buf.extend_from_slice(MAGIC);
    buf.push(VERSION_V1);
    buf.extend_from_slice(&envelope.kdf()?.iterations().to_le_bytes());
    buf.push(envelope.padding().to_byte());
    buf.extend_from_slice(envelope.salt());
    buf.extend_from_slice(envelope.iv());
    buf.extend_from_slice(envelope.ciphertext());

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EncryptedEnvelope {
        EncryptedEnvelope::new(
            KdfParams::new(250_000).unwrap(),
            Padding::Pkcs7,
            [1u8; 16],
            [2u8; 16],
            vec![9u8; 32],
        )
    }

    #[test]
    fn layout_is_fixed() {
        let bytes = serialize(&sample()).unwrap();

        assert_eq!(bytes.len(), HEADER_LEN + 32);
        assert_eq!(&bytes[..4], b"PWCR");
        assert_eq!(bytes[4], VERSION_V1);
        assert_eq!(&bytes[5..9], &250_000u32.to_le_bytes());
        assert_eq!(bytes[9], 1);
        assert_eq!(&bytes[10..26], &[1u8; 16]);
        assert_eq!(&bytes[26..42], &[2u8; 16]);
    }

    #[test]
    fn parse_reads_back_fields() {
        let bytes = serialize(&sample()).unwrap();
        let parsed = super::super::parse(&bytes).unwrap();

        assert_eq!(parsed, sample());
        assert_eq!(parsed.kdf().unwrap().iterations(), 250_000);
    }

    #[test]
    fn invalid_magic_fails() {
        let mut data = vec![0u8; HEADER_LEN + 16];
        data[..4].copy_from_slice(b"FAIL");

        assert!(super::super::parse(&data).is_err());
    }

    #[test]
    fn unsupported_version_fails() {
        let mut data = serialize(&sample()).unwrap();
        data[4] = 99;

        assert_eq!(
            super::super::parse(&data),
            Err(CipherError::UnsupportedVersion(99))
        );
    }

    #[test]
    fn too_short_fails() {
        assert!(super::super::parse(&[0u8; 3]).is_err());
        let bytes = serialize(&sample()).unwrap();
        assert!(parse(&bytes[..HEADER_LEN - 1]).is_err());
    }

    #[test]
    fn header_without_ciphertext_fails() {
        let bytes = serialize(&sample()).unwrap();
        assert_eq!(
            parse(&bytes[..HEADER_LEN]),
            Err(CipherError::InvalidCiphertextLength(0))
        );
    }

    #[test]
    fn unknown_padding_byte_fails() {
        let mut bytes = serialize(&sample()).unwrap();
        bytes[9] = 5;
        assert!(matches!(parse(&bytes), Err(CipherError::Format(_))));
    }

    #[test]
    fn zero_iterations_fail() {
        let mut bytes = serialize(&sample()).unwrap();
        bytes[5..9].copy_from_slice(&0u32.to_le_bytes());
        assert!(matches!(parse(&bytes), Err(CipherError::InvalidKdfParams(_))));
    }
}
