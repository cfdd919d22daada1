use aes_gcm::{
    aead::{generic_array::GenericArray, AeadInPlace, KeyInit},
    Aes128Gcm, Aes256Gcm,
};
use base64::{
    alphabet,
    engine::{general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD}, DecodePaddingMode},
    Engine as _,
};
use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroizing;

use crate::error::SealError;

/// The environment variable holding the base64 symmetric key.
pub const KEY_ENV_VAR: &str = "ENCRYPTION_KEY";
/// The size of the AES-GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;
/// The size of the AES-GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

const LENIENT_PADDING: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

/// Standard alphabet, padding optional on decode.
pub(crate) const STANDARD_LENIENT: GeneralPurpose =
    GeneralPurpose::new(&alphabet::STANDARD, LENIENT_PADDING);
/// URL-safe alphabet, padding optional on decode.
pub(crate) const URL_SAFE_LENIENT: GeneralPurpose =
    GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT_PADDING);

enum Cipher {
    Aes128(Aes128Gcm),
    Aes256(Aes256Gcm),
}

/// An imported AES-GCM key.
///
/// Built once at startup and shared read-only behind an `Arc`. The raw key
/// bytes are wiped as soon as the cipher has been keyed.
pub struct SealKey {
    cipher: Cipher,
}

impl std::fmt::Debug for SealKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealKey")
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}

impl SealKey {
    /// Loads the key from a variable source such as the process environment.
    ///
    /// # Errors
    ///
    /// [`SealError::Configuration`] if the variable is absent or empty, or if
    /// its value is not a base64 AES-128/AES-256 key.
    pub fn from_lookup<F>(name: &str, lookup: F) -> Result<Self, SealError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let encoded = lookup(name)
            .map(Zeroizing::new)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| SealError::Configuration(format!("Missing {} env var", name)))?;

        Self::from_base64(encoded.trim())
    }

    /// Decodes a base64 key. 16 bytes select AES-128-GCM, 32 bytes AES-256-GCM.
    pub fn from_base64(encoded: &str) -> Result<Self, SealError> {
        let raw = Zeroizing::new(STANDARD_LENIENT.decode(encoded).map_err(|e| {
            SealError::Configuration(format!("Key is not valid base64: {}", e))
        })?);

        Self::from_bytes(&raw)
    }

    /// Keys the cipher from raw bytes.
    pub fn from_bytes(raw: &[u8]) -> Result<Self, SealError> {
        let cipher = match raw.len() {
            16 => Aes128Gcm::new_from_slice(raw).map(Cipher::Aes128),
            32 => Aes256Gcm::new_from_slice(raw).map(Cipher::Aes256),
            n => {
                return Err(SealError::Configuration(format!(
                    "Key must decode to 16 or 32 bytes, got {}",
                    n
                )));
            }
        }
        .map_err(|_| SealError::Configuration("Invalid key length".to_string()))?;

        Ok(Self { cipher })
    }

    /// The AES key size in bits.
    pub fn bits(&self) -> u32 {
        match self.cipher {
            Cipher::Aes128(_) => 128,
            Cipher::Aes256(_) => 256,
        }
    }

    /// Encrypts `buffer` in place and returns the detached tag.
    pub(crate) fn encrypt_detached(
        &self,
        nonce: &[u8; NONCE_SIZE],
        buffer: &mut [u8],
    ) -> Result<[u8; TAG_SIZE], SealError> {
        let nonce = GenericArray::from_slice(&nonce[..]);
        let tag = match &self.cipher {
            Cipher::Aes128(c) => c.encrypt_in_place_detached(nonce, b"", buffer),
            Cipher::Aes256(c) => c.encrypt_in_place_detached(nonce, b"", buffer),
        }
        .map_err(|_| SealError::Encryption)?;

        let mut out = [0u8; TAG_SIZE];
        out.copy_from_slice(tag.as_slice());
        Ok(out)
    }

    /// Verifies `tag` and decrypts `buffer` in place.
    ///
    /// On failure the buffer content is unspecified and must be discarded.
    pub(crate) fn decrypt_detached(
        &self,
        nonce: &[u8; NONCE_SIZE],
        buffer: &mut [u8],
        tag: &[u8; TAG_SIZE],
    ) -> Result<(), SealError> {
        let nonce = GenericArray::from_slice(&nonce[..]);
        let tag = GenericArray::from_slice(&tag[..]);
        match &self.cipher {
            Cipher::Aes128(c) => c.decrypt_in_place_detached(nonce, b"", buffer, tag),
            Cipher::Aes256(c) => c.decrypt_in_place_detached(nonce, b"", buffer, tag),
        }
        .map_err(|_| SealError::Authentication)
    }
}

/// Generates a new random AES-GCM nonce.
pub fn generate_nonce() -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Generates a fresh random key of `bits` (128 or 256), base64 encoded.
pub fn generate_key_base64(bits: u32) -> Result<String, SealError> {
    let len = match bits {
        128 => 16,
        256 => 32,
        other => {
            return Err(SealError::Configuration(format!(
                "Unsupported key size: {} bits",
                other
            )));
        }
    };

    let mut key = Zeroizing::new(vec![0u8; len]);
    OsRng.fill_bytes(key.as_mut_slice());
    Ok(STANDARD.encode(key.as_slice()))
}
