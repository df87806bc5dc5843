// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-message envelope encryption.
//!
//! Sealing draws a fresh AES-256 key, encrypts the payload with AES-GCM and
//! wraps the key with the recipient's RSA public key:
//!
//! ```text
//! one_time_key = base64( RSA-OAEP-SHA256(aes_key) )
//! payload      = base64( nonce(12) || ciphertext || tag(16) )
//! ```
//!
//! Opening accepts AES keys of 16, 24 or 32 bytes. Any failure yields an
//! error; a partially decrypted payload is never returned.

use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{aes::Aes192, Aes128Gcm, Aes256Gcm, AesGcm, Nonce};
use base64ct::{Base64, Encoding};
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::error::{EncryptionError, EncryptionResult};
use super::exchange::SYMMETRIC_KEY_BYTES;

/// Size of the AES-GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

type Aes192Gcm = AesGcm<Aes192, U12>;

/// An encrypted message together with its wrapped one-time key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub one_time_key: String,
    pub payload: String,
}

impl Envelope {
    /// Encrypt `plaintext` for the holder of `recipient`'s private key.
    pub fn seal(plaintext: &[u8], recipient: &RsaPublicKey) -> EncryptionResult<Self> {
        let mut key = [0u8; SYMMETRIC_KEY_BYTES];
        OsRng.fill_bytes(&mut key);
        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);

        let cipher = Aes256Gcm::new((&key).into());
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|e| EncryptionError::EncryptionFailed(e.to_string()))?;

        let wrapped = recipient
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), &key)
            .map_err(|e| EncryptionError::EncryptionFailed(e.to_string()))?;

        let mut payload = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&ciphertext);

        Ok(Self {
            one_time_key: Base64::encode_string(&wrapped),
            payload: Base64::encode_string(&payload),
        })
    }

    /// Unwrap the one-time key with `private` and decrypt the payload.
    pub fn open(&self, private: &RsaPrivateKey) -> EncryptionResult<Vec<u8>> {
        let wrapped = Base64::decode_vec(&self.one_time_key)
            .map_err(|_| EncryptionError::MalformedEnvelope("one-time key is not base64"))?;
        let payload = Base64::decode_vec(&self.payload)
            .map_err(|_| EncryptionError::MalformedEnvelope("payload is not base64"))?;

        if payload.len() < NONCE_SIZE + TAG_SIZE {
            return Err(EncryptionError::MalformedEnvelope("payload is truncated"));
        }

        let key = private
            .decrypt(Oaep::new::<Sha256>(), &wrapped)
            .map_err(|_| EncryptionError::DecryptionFailed)?;

        let (nonce, ciphertext) = payload.split_at(NONCE_SIZE);
        match key.len() {
            16 => decrypt_with::<Aes128Gcm>(&key, nonce, ciphertext),
            24 => decrypt_with::<Aes192Gcm>(&key, nonce, ciphertext),
            32 => decrypt_with::<Aes256Gcm>(&key, nonce, ciphertext),
            other => Err(EncryptionError::InvalidKeyLength(other)),
        }
    }
}

fn decrypt_with<C>(key: &[u8], nonce: &[u8], ciphertext: &[u8]) -> EncryptionResult<Vec<u8>>
where
    C: KeyInit + Aead,
{
    let cipher =
        C::new_from_slice(key).map_err(|_| EncryptionError::InvalidKeyLength(key.len()))?;
    cipher
        .decrypt(aes_gcm::aead::Nonce::<C>::from_slice(nonce), ciphertext)
        .map_err(|_| EncryptionError::DecryptionFailed)
}
