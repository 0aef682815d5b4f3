//! The unit that is persisted or transmitted: salt, IV and ciphertext,
//! together with the KDF cost and padding mode needed to reopen it.

use serde::{Deserialize, Serialize};

use crate::crypto::{BLOCK_LEN, IV_LEN, KdfParams, Padding, SALT_LEN};
use crate::error::CipherError;
use crate::format::CURRENT_VERSION;

/// Ciphertext plus everything except the password needed to decrypt it.
///
/// None of the fields are secret. There is no authentication tag: a modified
/// envelope decrypts to garbage or fails unpadding, it is never detected as
/// tampered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEnvelope {
    version: u8,
    iterations: u32,
    padding: Padding,
    #[serde(with = "b64")]
    salt: [u8; SALT_LEN],
    #[serde(with = "b64")]
    iv: [u8; IV_LEN],
    #[serde(with = "b64")]
    ciphertext: Vec<u8>,
}

impl EncryptedEnvelope {
    pub fn new(
        kdf: KdfParams,
        padding: Padding,
        salt: [u8; SALT_LEN],
        iv: [u8; IV_LEN],
        ciphertext: Vec<u8>,
    ) -> Self {
        Self {
            version: CURRENT_VERSION,
            iterations: kdf.iterations(),
            padding,
            salt,
            iv,
            ciphertext,
        }
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    /// KDF parameters the key was derived with.
    pub fn kdf(&self) -> Result<KdfParams, CipherError> {
        KdfParams::new(self.iterations)
    }

    pub fn padding(&self) -> Padding {
        self.padding
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    pub fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Checks the invariants both the binary and JSON forms must hold.
    pub fn validate(&self) -> Result<(), CipherError> {
        if self.version != CURRENT_VERSION {
            return Err(CipherError::UnsupportedVersion(self.version));
        }
        self.kdf()?;
        if self.ciphertext.is_empty() || self.ciphertext.len() % BLOCK_LEN != 0 {
            return Err(CipherError::InvalidCiphertextLength(self.ciphertext.len()));
        }
        Ok(())
    }

    /// Binary container form, see [`crate::format`].
    pub fn to_bytes(&self) -> Result<Vec<u8>, CipherError> {
        crate::format::serialize(self)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, CipherError> {
        crate::format::parse(data)
    }

    pub fn to_json(&self) -> Result<String, CipherError> {
        self.validate()?;
        serde_json::to_string_pretty(self).map_err(|e| CipherError::Format(e.to_string()))
    }

    pub fn from_json(text: &str) -> Result<Self, CipherError> {
        let envelope: Self =
            serde_json::from_str(text).map_err(|e| CipherError::Format(e.to_string()))?;
        envelope.validate()?;
        Ok(envelope)
    }
}

/// Base64 (standard alphabet, padded) for byte fields.
mod b64 {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S, T>(bytes: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: AsRef<[u8]>,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<Vec<u8>>,
    {
        let text = String::deserialize(deserializer)?;
        let bytes = STANDARD.decode(text).map_err(de::Error::custom)?;
        let len = bytes.len();
        T::try_from(bytes).map_err(|_| de::Error::invalid_length(len, &"a field of the expected length"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EncryptedEnvelope {
        EncryptedEnvelope::new(
            KdfParams::new(1_000).unwrap(),
            Padding::Pkcs7,
            [1u8; 16],
            [2u8; 16],
            vec![3u8; 32],
        )
    }

    #[test]
    fn json_uses_base64_fields() {
        let json = sample().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["version"], 1);
        assert_eq!(value["iterations"], 1_000);
        assert_eq!(value["padding"], "pkcs7");
        assert_eq!(value["salt"], "AQEBAQEBAQEBAQEBAQEBAQ==");
        assert_eq!(value["iv"], "AgICAgICAgICAgICAgICAg==");

        assert_eq!(EncryptedEnvelope::from_json(&json).unwrap(), sample());
    }

    #[test]
    fn json_with_short_salt_is_rejected() {
        let json = sample()
            .to_json()
            .unwrap()
            .replace("AQEBAQEBAQEBAQEBAQEBAQ==", "AQEB");
        assert!(matches!(
            EncryptedEnvelope::from_json(&json),
            Err(CipherError::Format(_))
        ));
    }

    #[test]
    fn json_with_unknown_version_is_rejected() {
        let json = sample().to_json().unwrap().replace("\"version\": 1", "\"version\": 9");
        assert_eq!(
            EncryptedEnvelope::from_json(&json),
            Err(CipherError::UnsupportedVersion(9))
        );
    }

    #[test]
    fn validate_rejects_misaligned_ciphertext() {
        let envelope = EncryptedEnvelope::new(
            KdfParams::default(),
            Padding::Pkcs7,
            [0u8; 16],
            [0u8; 16],
            vec![0u8; 17],
        );
        assert_eq!(
            envelope.validate(),
            Err(CipherError::InvalidCiphertextLength(17))
        );
    }
}
