use aes::cipher::{
    BlockDecryptMut, BlockEncryptMut, KeyIvInit,
    block_padding::{NoPadding, Pkcs7},
};
use getrandom::fill;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::{BLOCK_LEN, IV_LEN, KEY_LEN, SALT_LEN};
use crate::error::CipherError;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// How plaintext is brought to a whole number of blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Padding {
    /// Caller supplies non-empty block-aligned plaintext; anything else is
    /// rejected.
    None,
    /// PKCS#7, added on encrypt and stripped on decrypt.
    #[default]
    Pkcs7,
}

impl Padding {
    pub fn to_byte(self) -> u8 {
        match self {
            Padding::None => 0,
            Padding::Pkcs7 => 1,
        }
    }

    pub fn from_byte(byte: u8) -> Result<Self, CipherError> {
        match byte {
            0 => Ok(Padding::None),
            1 => Ok(Padding::Pkcs7),
            other => Err(CipherError::Format(format!("unknown padding mode {other}"))),
        }
    }
}

/// Fill buffer with cryptographically secure random bytes
fn secure_random(buf: &mut [u8]) -> Result<(), CipherError> {
    fill(buf).map_err(|_| CipherError::Randomness)
}

/// Generate salt
pub fn generate_salt() -> Result<[u8; SALT_LEN], CipherError> {
    let mut salt = [0u8; SALT_LEN];
    secure_random(&mut salt)?;
    Ok(salt)
}

/// Generate IV
pub fn generate_iv() -> Result<[u8; IV_LEN], CipherError> {
    let mut iv = [0u8; IV_LEN];
    secure_random(&mut iv)?;
    Ok(iv)
}

fn check_key_iv(key: &[u8], iv: &[u8]) -> Result<(), CipherError> {
    if key.len() != KEY_LEN {
        return Err(CipherError::InvalidKeyLength {
            expected: KEY_LEN,
            actual: key.len(),
        });
    }
    if iv.len() != IV_LEN {
        return Err(CipherError::InvalidIvLength {
            expected: IV_LEN,
            actual: iv.len(),
        });
    }
    Ok(())
}

/// Encrypt plaintext with AES-256-CBC
pub fn encrypt(
    key: &[u8],
    iv: &[u8],
    plaintext: &[u8],
    padding: Padding,
) -> Result<Vec<u8>, CipherError> {
    check_key_iv(key, iv)?;

    let cipher = Aes256CbcEnc::new_from_slices(key, iv).map_err(|_| {
        CipherError::InvalidKeyLength {
            expected: KEY_LEN,
            actual: key.len(),
        }
    })?;

    let ciphertext = match padding {
        Padding::Pkcs7 => cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        Padding::None => {
            // NoPadding panics on a partial block, and an empty message would
            // leave an envelope with no ciphertext block to open.
            if plaintext.is_empty() || plaintext.len() % BLOCK_LEN != 0 {
                return Err(CipherError::InvalidPlaintextLength(plaintext.len()));
            }
            cipher.encrypt_padded_vec_mut::<NoPadding>(plaintext)
        }
    };

    Ok(ciphertext)
}

/// Decrypt AES-256-CBC ciphertext
pub fn decrypt(
    key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
    padding: Padding,
) -> Result<Zeroizing<Vec<u8>>, CipherError> {
    check_key_iv(key, iv)?;
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
        return Err(CipherError::InvalidCiphertextLength(ciphertext.len()));
    }

    let cipher = Aes256CbcDec::new_from_slices(key, iv).map_err(|_| {
        CipherError::InvalidKeyLength {
            expected: KEY_LEN,
            actual: key.len(),
        }
    })?;

    let plaintext = match padding {
        Padding::Pkcs7 => cipher
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CipherError::DecryptionKeyMismatch)?,
        Padding::None => cipher
            .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
            .map_err(|_| CipherError::InvalidCiphertextLength(ciphertext.len()))?,
    };

    Ok(Zeroizing::new(plaintext))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 32] = [0x11; 32];
    const IV: [u8; 16] = [0x22; 16];

    #[test]
    fn pkcs7_roundtrip() {
        let ct = encrypt(&KEY, &IV, b"Hello, World!", Padding::Pkcs7).unwrap();
        assert_eq!(ct.len(), 16);

        let pt = decrypt(&KEY, &IV, &ct, Padding::Pkcs7).unwrap();
        assert_eq!(&pt[..], b"Hello, World!");
    }

    #[test]
    fn pkcs7_aligned_input_gains_full_block() {
        let ct = encrypt(&KEY, &IV, &[0u8; 32], Padding::Pkcs7).unwrap();
        assert_eq!(ct.len(), 48);
    }

    #[test]
    fn pkcs7_empty_plaintext_roundtrip() {
        let ct = encrypt(&KEY, &IV, b"", Padding::Pkcs7).unwrap();
        assert_eq!(ct.len(), 16);
        assert!(decrypt(&KEY, &IV, &ct, Padding::Pkcs7).unwrap().is_empty());
    }

    #[test]
    fn no_padding_requires_aligned_plaintext() {
        assert_eq!(
            encrypt(&KEY, &IV, b"Hello, World!", Padding::None),
            Err(CipherError::InvalidPlaintextLength(13))
        );

        assert_eq!(
            encrypt(&KEY, &IV, b"", Padding::None),
            Err(CipherError::InvalidPlaintextLength(0))
        );

        let ct = encrypt(&KEY, &IV, b"exactly16bytes!!", Padding::None).unwrap();
        assert_eq!(ct.len(), 16);
        let pt = decrypt(&KEY, &IV, &ct, Padding::None).unwrap();
        assert_eq!(&pt[..], b"exactly16bytes!!");
    }

    #[test]
    fn matches_nist_sp800_38a_cbc_aes256() {
        // F.2.5 CBC-AES256.Encrypt, first block
        let key: [u8; 32] = [
            0x60, 0x3d, 0xeb, 0x10, 0x15, 0xca, 0x71, 0xbe, 0x2b, 0x73, 0xae, 0xf0, 0x85, 0x7d,
            0x77, 0x81, 0x1f, 0x35, 0x2c, 0x07, 0x3b, 0x61, 0x08, 0xd7, 0x2d, 0x98, 0x10, 0xa3,
            0x09, 0x14, 0xdf, 0xf4,
        ];
        let iv: [u8; 16] = [
            0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d,
            0x0e, 0x0f,
        ];
        let plaintext: [u8; 16] = [
            0x6b, 0xc1, 0xbe, 0xe2, 0x2e, 0x40, 0x9f, 0x96, 0xe9, 0x3d, 0x7e, 0x11, 0x73, 0x93,
            0x17, 0x2a,
        ];
        let expected: [u8; 16] = [
            0xf5, 0x8c, 0x4c, 0x04, 0xd6, 0xe5, 0xf1, 0xba, 0x77, 0x9e, 0xab, 0xfb, 0x5f, 0x7b,
            0xfb, 0xd6,
        ];

        let ct = encrypt(&key, &iv, &plaintext, Padding::None).unwrap();
        assert_eq!(ct, expected);
    }

    #[test]
    fn wrong_key_length_is_reported() {
        assert_eq!(
            encrypt(&[0u8; 16], &IV, b"x", Padding::Pkcs7),
            Err(CipherError::InvalidKeyLength {
                expected: 32,
                actual: 16
            })
        );
        assert!(matches!(
            decrypt(&[0u8; 31], &IV, &[0u8; 16], Padding::Pkcs7),
            Err(CipherError::InvalidKeyLength { actual: 31, .. })
        ));
    }

    #[test]
    fn wrong_iv_length_is_reported() {
        assert_eq!(
            encrypt(&KEY, &[0u8; 12], b"x", Padding::Pkcs7),
            Err(CipherError::InvalidIvLength {
                expected: 16,
                actual: 12
            })
        );
    }

    #[test]
    fn misaligned_ciphertext_is_rejected() {
        assert!(matches!(
            decrypt(&KEY, &IV, &[0u8; 15], Padding::Pkcs7),
            Err(CipherError::InvalidCiphertextLength(15))
        ));
        assert!(matches!(
            decrypt(&KEY, &IV, &[], Padding::Pkcs7),
            Err(CipherError::InvalidCiphertextLength(0))
        ));
    }

    #[test]
    fn tampered_iv_only_garbles_first_block() {
        let plaintext = b"first block 0123second block 456";
        let ct = encrypt(&KEY, &IV, plaintext, Padding::Pkcs7).unwrap();

        let mut iv = IV;
        iv[0] ^= 0x01;
        let pt = decrypt(&KEY, &iv, &ct, Padding::Pkcs7).unwrap();

        assert_ne!(&pt[..], plaintext);
        assert_eq!(pt[0], plaintext[0] ^ 0x01);
        assert_eq!(&pt[16..], &plaintext[16..]);
    }

    #[test]
    fn padding_byte_roundtrip() {
        for p in [Padding::None, Padding::Pkcs7] {
            assert_eq!(Padding::from_byte(p.to_byte()).unwrap(), p);
        }
        assert!(Padding::from_byte(7).is_err());
    }

    #[test]
    fn generated_values_differ() {
        assert_ne!(generate_salt().unwrap(), generate_salt().unwrap());
        assert_ne!(generate_iv().unwrap(), generate_iv().unwrap());
    }
}
