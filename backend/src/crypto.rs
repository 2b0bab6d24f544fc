//! AES-256-GCM cipher for PII columns.
//!
//! Ciphertexts are stored as base64(nonce || ciphertext || tag). Decryption
//! failures on read paths degrade to `None` via [`FieldCipher::decrypt_opt`]
//! so one corrupt field never takes down a whole response.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

const NONCE_LEN: usize = 12;

#[derive(thiserror::Error, Debug)]
pub enum CryptoError {
    #[error("key must be 64 hex characters (32 bytes)")]
    BadKey,

    #[error("malformed ciphertext")]
    Malformed,

    #[error("decryption failed")]
    Failed,
}

#[derive(Clone)]
pub struct FieldCipher {
    cipher: Aes256Gcm,
}

impl FieldCipher {
    pub fn from_hex_key(hex_key: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(hex_key).map_err(|_| CryptoError::BadKey)?;
        let cipher = Aes256Gcm::new_from_slice(&bytes).map_err(|_| CryptoError::BadKey)?;
        Ok(Self { cipher })
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::Failed)?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(nonce.as_slice());
        out.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(out))
    }

    pub fn decrypt(&self, token: &str) -> Result<String, CryptoError> {
        let raw = BASE64.decode(token).map_err(|_| CryptoError::Malformed)?;
        if raw.len() <= NONCE_LEN {
            return Err(CryptoError::Malformed);
        }
        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::Failed)?;
        String::from_utf8(plaintext).map_err(|_| CryptoError::Malformed)
    }

    /// Decrypt a stored field, logging and yielding `None` on failure.
    /// Response payloads stay available even when a single field is corrupt.
    pub fn decrypt_opt(&self, token: &str, field: &'static str) -> Option<String> {
        match self.decrypt(token) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(field, "failed to decrypt stored field: {}", e);
                None
            }
        }
    }
}
