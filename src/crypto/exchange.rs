// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! RSA key pairs for the one-time handshake.

use std::fmt;

use base64ct::{Base64, Encoding};
use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};

use super::error::{EncryptionError, EncryptionResult};

/// Modulus size of handshake keys.
pub const KEY_BITS: usize = 2048;

/// Size of the per-message AES key generated when sealing.
pub const SYMMETRIC_KEY_BYTES: usize = 32;

/// Local half of the key exchange.
pub struct KeyPair {
    private: RsaPrivateKey,
    public: RsaPublicKey,
}

impl KeyPair {
    /// Generate a fresh RSA-2048 key pair.
    ///
    /// CPU-bound; async callers should run it on a blocking thread.
    pub fn generate() -> EncryptionResult<Self> {
        let private = RsaPrivateKey::new(&mut OsRng, KEY_BITS)
            .map_err(|e| EncryptionError::KeyGeneration(e.to_string()))?;
        let public = RsaPublicKey::from(&private);
        Ok(Self { private, public })
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }

    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private
    }

    /// Handshake message announcing the public half.
    pub fn announce(&self) -> EncryptionResult<PublicKeyMessage> {
        PublicKeyMessage::from_key(&self.public)
    }

    pub fn into_private_key(self) -> RsaPrivateKey {
        self.private
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("bits", &(self.public.size() * 8))
            .finish_non_exhaustive()
    }
}

/// Public key as exchanged during the handshake.
///
/// `encoded_key` is the base64 text of the X.509 SubjectPublicKeyInfo DER
/// encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyMessage {
    pub encoded_key: String,
}

impl PublicKeyMessage {
    pub fn from_key(key: &RsaPublicKey) -> EncryptionResult<Self> {
        let der = key
            .to_public_key_der()
            .map_err(|e| EncryptionError::InvalidPublicKey(e.to_string()))?;
        Ok(Self {
            encoded_key: Base64::encode_string(der.as_bytes()),
        })
    }

    /// Decode and validate the announced key.
    ///
    /// Keys weaker than [`KEY_BITS`] are refused.
    pub fn to_key(&self) -> EncryptionResult<RsaPublicKey> {
        let der = Base64::decode_vec(&self.encoded_key)
            .map_err(|_| EncryptionError::InvalidPublicKey("not valid base64".to_string()))?;
        let key = RsaPublicKey::from_public_key_der(&der)
            .map_err(|e| EncryptionError::InvalidPublicKey(e.to_string()))?;

        let bits = key.size() * 8;
        if bits < KEY_BITS {
            return Err(EncryptionError::InvalidPublicKey(format!(
                "{bits}-bit modulus is too small"
            )));
        }
        Ok(key)
    }
}
