use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use zeroize::Zeroizing;

use crate::crypto::key::{
    generate_nonce, SealKey, NONCE_SIZE, STANDARD_LENIENT, TAG_SIZE, URL_SAFE_LENIENT,
};
use crate::error::SealError;
use crate::models::payload::Payload;

/// Segment separator in the wire format `nonce.ciphertext.tag`.
pub const SEGMENT_SEPARATOR: char = '.';

/// Seals payloads into tokens and opens them again.
///
/// Cloning shares the same immutable keyed cipher.
#[derive(Debug, Clone)]
pub struct PayloadSealer {
    key: Arc<SealKey>,
}

impl PayloadSealer {
    /// Creates a sealer over an imported key.
    pub fn new(key: impl Into<Arc<SealKey>>) -> Self {
        Self { key: key.into() }
    }

    /// Encrypts `payload` into `b64(nonce).b64(ciphertext).b64(tag)`.
    ///
    /// A fresh random nonce is drawn on every call, so sealing the same payload
    /// twice yields two different tokens.
    pub fn seal(&self, payload: &Payload) -> Result<String, SealError> {
        let mut buffer = Zeroizing::new(
            sonic_rs::to_vec(payload)
                .map_err(|_| SealError::Payload("payload could not be serialized"))?,
        );

        let nonce = generate_nonce();
        let tag = self.key.encrypt_detached(&nonce, buffer.as_mut_slice())?;

        Ok(format!(
            "{}{sep}{}{sep}{}",
            STANDARD.encode(nonce),
            STANDARD.encode(buffer.as_slice()),
            STANDARD.encode(tag),
            sep = SEGMENT_SEPARATOR,
        ))
    }

    /// Verifies and decrypts a token.
    ///
    /// # Errors
    ///
    /// * [`SealError::Format`] - not exactly three segments, a segment that is
    ///   not base64, or a nonce/tag of the wrong size.
    /// * [`SealError::Authentication`] - the tag does not verify.
    /// * [`SealError::Payload`] - the plaintext is not a payload record.
    pub fn open(&self, token: &str) -> Result<Payload, SealError> {
        let (nonce, mut buffer, tag) = parse_token(token)?;

        self.key.decrypt_detached(&nonce, buffer.as_mut_slice(), &tag)?;

        sonic_rs::from_slice::<Payload>(buffer.as_slice())
            .map_err(|_| SealError::Payload("plaintext is not a payload record"))
    }
}

type TokenParts = ([u8; NONCE_SIZE], Zeroizing<Vec<u8>>, [u8; TAG_SIZE]);

fn parse_token(token: &str) -> Result<TokenParts, SealError> {
    let mut segments = token.split(SEGMENT_SEPARATOR);
    let (Some(nonce), Some(ciphertext), Some(tag), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(SealError::Format("expected three segments"));
    };

    let nonce: [u8; NONCE_SIZE] = decode_segment(nonce)?
        .try_into()
        .map_err(|_| SealError::Format("nonce must be 12 bytes"))?;
    let tag: [u8; TAG_SIZE] = decode_segment(tag)?
        .try_into()
        .map_err(|_| SealError::Format("tag must be 16 bytes"))?;
    let ciphertext = Zeroizing::new(decode_segment(ciphertext)?);

    Ok((nonce, ciphertext, tag))
}

/// Standard alphabet first, URL-safe second; padding is optional in both.
fn decode_segment(segment: &str) -> Result<Vec<u8>, SealError> {
    STANDARD_LENIENT
        .decode(segment)
        .or_else(|_| URL_SAFE_LENIENT.decode(segment))
        .map_err(|_| SealError::Format("segment is not base64"))
}
